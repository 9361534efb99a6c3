// Perception boundary: camera frame in, observation out

pub mod emotion;
pub mod objects;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::models::{Frame, Observation};
use emotion::EmotionReader;
use objects::{load_class_names, ObjectDetector};
use tracing::{info, warn};

/// Detector label that never counts as a product
pub const PERSON_LABEL: &str = "person";

/// Single synchronous reading of one frame
pub trait Perception {
    /// Never fails: internal errors yield [`Observation::empty`]
    fn observe(&mut self, frame: &Frame) -> Observation;
}

/// Drops the generic person label, keeping detector order
pub fn product_labels(objects: &[String]) -> Vec<&str> {
    objects
        .iter()
        .map(String::as_str)
        .filter(|label| !label.eq_ignore_ascii_case(PERSON_LABEL))
        .collect()
}

/// Perception backed by the YOLO detector and the emotion classifier
pub struct ModelPerception {
    detector: ObjectDetector,
    emotions: EmotionReader,
}

impl ModelPerception {
    /// Loads every model named in the configuration
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let class_names = match &config.object_names {
            Some(path) => Some(load_class_names(path)?),
            None => None,
        };
        let detector = ObjectDetector::new(
            &config.object_detector,
            class_names,
            config.detection_confidence,
            config.nms_iou,
        )?;
        let emotions = EmotionReader::new(
            &config.face_cascade,
            &config.emotion_classifier,
            config.emotion_classes()?,
        )?;
        info!("Perception models loaded");

        Ok(Self { detector, emotions })
    }

    fn try_observe(&mut self, frame: &Frame) -> Result<Observation> {
        let objects = self.detector.detect(frame)?;
        let emotion = self.emotions.read(frame)?;
        Ok(Observation::new(objects, emotion))
    }
}

impl Perception for ModelPerception {
    fn observe(&mut self, frame: &Frame) -> Observation {
        if !frame.is_well_formed() {
            warn!(
                "Skipping malformed frame {}x{} ({} bytes)",
                frame.width,
                frame.height,
                frame.data.len()
            );
            return Observation::empty();
        }
        match self.try_observe(frame) {
            Ok(observation) => observation,
            Err(e) => {
                warn!("Perception failed, treating frame as empty: {}", e);
                Observation::empty()
            }
        }
    }
}
