// Emotion reading: Haar cascade face detection plus ONNX classification

use crate::error::{KioskError, Result};
use crate::models::{Emotion, Frame};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use tracing::{debug, error};

/// Classifier input edge length (HSEmotion)
const FACE_INPUT_SIZE: usize = 260;

/// Classifier output order: 0=Angry, 1=Disgust, 2=Fear, 3=Happy, 4=Sad,
/// 5=Surprise, 6=Neutral, 7=Contempt (folded into Disgust)
pub const EMOTION_CLASSES: [Emotion; 8] = [
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Happy,
    Emotion::Sad,
    Emotion::Surprised,
    Emotion::Neutral,
    Emotion::Disgust,
];

/// A cropped grayscale face
pub struct FaceCrop {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Face detector using OpenCV Haar Cascade
pub struct FaceDetector {
    classifier: CascadeClassifier,
}

impl FaceDetector {
    /// Creates a new FaceDetector by loading the Haar Cascade classifier
    pub fn new(cascade_path: &Path) -> Result<Self> {
        let path = cascade_path.to_string_lossy();
        let classifier = CascadeClassifier::new(&path).map_err(|e| {
            error!("Failed to load Haar Cascade: {}", e);
            KioskError::ModelLoad(format!("Haar Cascade load failed: {e}"))
        })?;

        if classifier.empty()? {
            return Err(KioskError::ModelLoad(format!(
                "Haar Cascade classifier at {path} is empty"
            )));
        }

        Ok(Self { classifier })
    }

    /// Finds the most prominent (largest) face in the frame, if any
    pub fn largest_face(&mut self, frame: &Frame) -> Result<Option<FaceCrop>> {
        let mat = Mat::from_slice(&frame.data)
            .map_err(|e| KioskError::FaceDetection(format!("Failed to create Mat: {e}")))?;
        let mat = mat
            .reshape(3, frame.height as i32)
            .map_err(|e| KioskError::FaceDetection(format!("Failed to reshape Mat: {e}")))?;

        let mut gray = Mat::default();
        imgproc::cvt_color(
            &mat,
            &mut gray,
            imgproc::COLOR_RGB2GRAY,
            0,
            opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| {
            KioskError::FaceDetection(format!("Failed to convert to grayscale: {e}"))
        })?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &gray,
                &mut faces,
                1.1,
                5,
                0,
                Size::new(40, 40),
                Size::new(0, 0),
            )
            .map_err(|e| KioskError::FaceDetection(format!("Face detection failed: {e}")))?;

        let largest = faces.iter().fold(None::<Rect>, |best, rect| match best {
            Some(b) if b.area() >= rect.area() => Some(b),
            _ => Some(rect),
        });

        match largest {
            Some(rect) => {
                debug!("Largest of {} faces: {:?}", faces.len(), rect);
                Ok(Some(self.crop(&gray, rect)?))
            }
            None => Ok(None),
        }
    }

    fn crop(&self, gray: &Mat, rect: Rect) -> Result<FaceCrop> {
        let roi = Mat::roi(gray, rect)
            .map_err(|e| KioskError::FaceDetection(format!("Failed to crop face region: {e}")))?;

        // ROI views are not continuous; clone before reading bytes
        let continuous = roi
            .try_clone()
            .map_err(|e| KioskError::FaceDetection(format!("Failed to clone face ROI: {e}")))?;
        let data = continuous
            .data_bytes()
            .map_err(|e| KioskError::FaceDetection(format!("Failed to get face data: {e}")))?;

        Ok(FaceCrop {
            data: data.to_vec(),
            width: rect.width as u32,
            height: rect.height as u32,
        })
    }
}

/// Resizes a grayscale face to the classifier input and returns CHW floats in [0, 1]
fn preprocess_face(face: &FaceCrop) -> Result<Vec<f32>> {
    let face_mat = Mat::from_slice(&face.data)
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to create face Mat: {e}")))?;
    let face_mat = face_mat
        .reshape(1, face.height as i32)
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to reshape face Mat: {e}")))?;

    let mut rgb_mat = Mat::default();
    imgproc::cvt_color_def(&face_mat, &mut rgb_mat, imgproc::COLOR_GRAY2RGB)
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to convert to RGB: {e}")))?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb_mat,
        &mut resized,
        Size::new(FACE_INPUT_SIZE as i32, FACE_INPUT_SIZE as i32),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .map_err(|e| KioskError::FrameProcessing(format!("Failed to resize face: {e}")))?;

    let hwc = resized
        .data_bytes()
        .map_err(|e| KioskError::FrameProcessing(format!("Failed to get resized data: {e}")))?;

    Ok(hwc_to_chw(hwc, FACE_INPUT_SIZE, FACE_INPUT_SIZE, 3))
}

/// Reorders interleaved pixels into planar channels, scaling to [0, 1]
pub(crate) fn hwc_to_chw(hwc: &[u8], height: usize, width: usize, channels: usize) -> Vec<f32> {
    let mut chw = vec![0.0f32; channels * height * width];
    for h in 0..height {
        for w in 0..width {
            for c in 0..channels {
                let hwc_idx = (h * width + w) * channels + c;
                let chw_idx = c * (height * width) + h * width + w;
                chw[chw_idx] = hwc[hwc_idx] as f32 / 255.0;
            }
        }
    }
    chw
}

/// Converts logits to a probability distribution
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Index and value of the highest probability; ties keep the earliest class
pub fn argmax_first(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((idx, p)),
        })
}

/// Emotion classifier using ONNX Runtime
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    /// Creates a new EmotionClassifier by loading the ONNX model
    pub fn new(model_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| KioskError::ModelLoad(format!("Failed to create session builder: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load ONNX model: {}", e);
                KioskError::ModelLoad(format!("ONNX model load failed: {e}"))
            })?;

        Ok(Self { session })
    }

    /// Returns the softmax distribution over the model's outputs
    pub fn distribution(&mut self, face_chw: Vec<f32>) -> Result<Vec<f32>> {
        let input_array = ndarray::Array4::from_shape_vec(
            (1, 3, FACE_INPUT_SIZE, FACE_INPUT_SIZE),
            face_chw,
        )
        .map_err(|e| KioskError::OnnxRuntime(format!("Failed to create input array: {e}")))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| KioskError::OnnxRuntime(format!("Failed to create input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| KioskError::OnnxRuntime(format!("Inference failed: {e}")))?;

        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| KioskError::OnnxRuntime("No output from model".to_string()))?;

        let (_, logits) = output_value.try_extract_tensor::<f32>().map_err(|e| {
            KioskError::OnnxRuntime(format!("Failed to extract output tensor: {e}"))
        })?;

        Ok(softmax(logits))
    }
}

/// Face detection and classification combined into one reading
pub struct EmotionReader {
    face_detector: FaceDetector,
    classifier: EmotionClassifier,
    /// Emotion for each classifier output index
    classes: Vec<Emotion>,
}

impl EmotionReader {
    /// Loads the cascade and the classifier; `classes` maps output indices
    pub fn new(cascade_path: &Path, model_path: &Path, classes: Vec<Emotion>) -> Result<Self> {
        Ok(Self {
            face_detector: FaceDetector::new(cascade_path)?,
            classifier: EmotionClassifier::new(model_path)?,
            classes,
        })
    }

    /// Best-guess emotion of the most prominent face, `None` without a face
    pub fn read(&mut self, frame: &Frame) -> Result<Option<Emotion>> {
        let Some(face) = self.face_detector.largest_face(frame)? else {
            return Ok(None);
        };

        let input = preprocess_face(&face)?;
        let probabilities = self.classifier.distribution(input)?;
        Ok(argmax_first(&probabilities).and_then(|(idx, p)| {
            let emotion = self.classes.get(idx).copied();
            debug!("Emotion {:?} ({:.2})", emotion, p);
            emotion
        }))
    }
}
