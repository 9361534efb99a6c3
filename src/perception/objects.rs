// Object detection with a YOLOv8 ONNX export

use super::emotion::hwc_to_chw;
use crate::error::{KioskError, Result};
use crate::models::Frame;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::session::Session;
use ort::value::Value;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, error, info};

/// YOLOv8 input edge length
const INPUT_SIZE: usize = 640;

/// COCO class names in YOLOv8 output order
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// One detected region, box in model input coordinates (x1, y1, x2, y2)
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Intersection over union of two boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);
    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Decodes a `[4 + classes, anchors]` YOLOv8 output (batch dimension removed).
///
/// Each anchor contributes its best-scoring class when that score clears
/// `threshold`.
pub fn decode_output(output: &[f32], num_classes: usize, threshold: f32) -> Vec<Detection> {
    let rows = 4 + num_classes;
    if num_classes == 0 || output.len() % rows != 0 {
        return Vec::new();
    }
    let anchors = output.len() / rows;
    let at = |row: usize, anchor: usize| output[row * anchors + anchor];

    (0..anchors)
        .filter_map(|a| {
            let (class_id, confidence) = (0..num_classes)
                .map(|c| (c, at(4 + c, a)))
                .fold((0, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 {
                        cur
                    } else {
                        best
                    }
                });
            if confidence < threshold {
                return None;
            }
            let (cx, cy, w, h) = (at(0, a), at(1, a), at(2, a), at(3, a));
            Some(Detection {
                class_id,
                confidence,
                bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            })
        })
        .collect()
}

/// Class-aware greedy suppression; result is ordered by descending confidence
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for det in detections {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(&k.bbox, &det.bbox) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

/// Reads class names, one per line, skipping blanks
pub fn load_class_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(KioskError::ModelLoad(format!(
            "No class names in {}",
            path.display()
        )));
    }
    Ok(names)
}

/// YOLOv8 detector running through ONNX Runtime
pub struct ObjectDetector {
    session: Session,
    class_names: Vec<String>,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl ObjectDetector {
    /// Loads the model; `class_names` defaults to COCO when `None`
    pub fn new(
        model_path: &Path,
        class_names: Option<Vec<String>>,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| {
                KioskError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load detector model: {}", e);
                KioskError::ModelLoad(format!("Detector load failed: {e}"))
            })?;

        let class_names =
            class_names.unwrap_or_else(|| COCO_CLASSES.iter().map(|s| s.to_string()).collect());
        info!(
            "Object detector loaded from {} ({} classes)",
            model_path.display(),
            class_names.len()
        );

        Ok(Self {
            session,
            class_names,
            confidence_threshold,
            iou_threshold,
        })
    }

    /// Labels of detected objects, most confident first
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<String>> {
        let input = self.preprocess(frame)?;
        let input_array = ndarray::Array4::from_shape_vec((1, 3, INPUT_SIZE, INPUT_SIZE), input)
            .map_err(|e| {
                KioskError::ObjectDetection(format!("Failed to create input array: {e}"))
            })?;
        let input_tensor = Value::from_array(input_array)?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| KioskError::OnnxRuntime("No output from detector".to_string()))?;
        let (_, raw) = output_value.try_extract_tensor::<f32>()?;

        let detections = non_max_suppression(
            decode_output(raw, self.class_names.len(), self.confidence_threshold),
            self.iou_threshold,
        );
        debug!("Detected {} objects", detections.len());

        Ok(detections
            .into_iter()
            .filter_map(|d| self.class_names.get(d.class_id).cloned())
            .collect())
    }

    fn preprocess(&self, frame: &Frame) -> Result<Vec<f32>> {
        let mat = Mat::from_slice(&frame.data)
            .map_err(|e| KioskError::ObjectDetection(format!("Failed to create Mat: {e}")))?;
        let mat = mat
            .reshape(3, frame.height as i32)
            .map_err(|e| KioskError::ObjectDetection(format!("Failed to reshape Mat: {e}")))?;

        let mut resized = Mat::default();
        imgproc::resize(
            &mat,
            &mut resized,
            Size::new(INPUT_SIZE as i32, INPUT_SIZE as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(|e| KioskError::ObjectDetection(format!("Failed to resize frame: {e}")))?;

        let hwc = resized
            .data_bytes()
            .map_err(|e| KioskError::ObjectDetection(format!("Failed to get frame data: {e}")))?;
        Ok(hwc_to_chw(hwc, INPUT_SIZE, INPUT_SIZE, 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a `[4 + classes, anchors]` buffer from per-anchor rows
    fn layout(anchors: &[[f32; 6]]) -> Vec<f32> {
        let rows = 6;
        let mut out = vec![0.0; rows * anchors.len()];
        for (a, values) in anchors.iter().enumerate() {
            for (r, v) in values.iter().enumerate() {
                out[r * anchors.len() + a] = *v;
            }
        }
        out
    }

    #[test]
    fn test_iou() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        let half = iou(&a, &[5.0, 0.0, 15.0, 10.0]);
        assert!((half - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_keeps_best_class_above_threshold() {
        // cx, cy, w, h, class0, class1
        let output = layout(&[
            [50.0, 50.0, 20.0, 20.0, 0.1, 0.9],
            [10.0, 10.0, 4.0, 4.0, 0.2, 0.1],
        ]);
        let dets = decode_output(&output, 2, 0.5);
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 1);
        assert_eq!(dets[0].bbox, [40.0, 40.0, 60.0, 60.0]);
    }

    #[test]
    fn test_decode_rejects_mismatched_shape() {
        assert!(decode_output(&[0.0; 7], 2, 0.1).is_empty());
    }

    #[test]
    fn test_nms_is_class_aware_and_sorted() {
        let dets = vec![
            Detection {
                class_id: 0,
                confidence: 0.6,
                bbox: [0.0, 0.0, 10.0, 10.0],
            },
            Detection {
                class_id: 0,
                confidence: 0.8,
                bbox: [1.0, 1.0, 11.0, 11.0],
            },
            Detection {
                class_id: 1,
                confidence: 0.7,
                bbox: [0.0, 0.0, 10.0, 10.0],
            },
        ];
        let kept = non_max_suppression(dets, 0.45);
        let summary: Vec<(usize, f32)> =
            kept.iter().map(|d| (d.class_id, d.confidence)).collect();
        assert_eq!(summary, vec![(0, 0.8), (1, 0.7)]);
    }

    #[test]
    fn test_load_class_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "book\n\n  cup  \n").unwrap();
        let names = load_class_names(file.path()).unwrap();
        assert_eq!(names, vec!["book".to_string(), "cup".to_string()]);
    }

    #[test]
    fn test_load_class_names_empty_file_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_class_names(file.path()).is_err());
    }
}
