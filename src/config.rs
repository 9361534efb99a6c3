// Kiosk configuration loaded from TOML

use crate::error::{KioskError, Result};
use crate::models::Emotion;
use crate::perception::emotion::EMOTION_CLASSES;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Camera device selection
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Model files and detector thresholds
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub object_detector: PathBuf,
    /// Newline-separated class names; COCO when absent
    pub object_names: Option<PathBuf>,
    pub face_cascade: PathBuf,
    pub emotion_classifier: PathBuf,
    /// Emotion for each classifier output, in output order; HSEmotion order when absent
    pub emotion_labels: Option<Vec<String>>,
    pub detection_confidence: f32,
    pub nms_iou: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            object_detector: PathBuf::from("assets/models/yolov8n.onnx"),
            object_names: None,
            face_cascade: PathBuf::from("assets/models/haarcascade_frontalface_default.xml"),
            emotion_classifier: PathBuf::from("assets/models/emotion.onnx"),
            emotion_labels: None,
            detection_confidence: 0.25,
            nms_iou: 0.45,
        }
    }
}

impl ModelConfig {
    /// Emotion for each classifier output index
    pub fn emotion_classes(&self) -> Result<Vec<Emotion>> {
        let Some(labels) = &self.emotion_labels else {
            return Ok(EMOTION_CLASSES.to_vec());
        };
        if labels.is_empty() {
            return Err(KioskError::Config(
                "models.emotion_labels must not be empty".to_string(),
            ));
        }
        labels
            .iter()
            .map(|label| {
                label
                    .parse::<Emotion>()
                    .map_err(|e| KioskError::Config(format!("models.emotion_labels: {e}")))
            })
            .collect()
    }
}

/// Product catalog source
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("product_data.csv"),
        }
    }
}

/// Log file and default filter
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("emoticart.log"),
            filter: "info".to_string(),
        }
    }
}

/// Top-level configuration, every section optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct KioskConfig {
    pub camera: CameraConfig,
    pub models: ModelConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

impl KioskConfig {
    /// Parses TOML text without touching the filesystem
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: KioskConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads a config file, rebasing relative paths on its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            KioskError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut cfg = Self::from_toml(&text)?;
        cfg.rebase_paths(path);
        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Loads `path` when it exists, otherwise falls back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let unit = 0.0f32..=1.0;
        if !unit.contains(&self.models.detection_confidence) {
            return Err(KioskError::Config(format!(
                "models.detection_confidence must be within [0, 1], got {}",
                self.models.detection_confidence
            )));
        }
        if !unit.contains(&self.models.nms_iou) {
            return Err(KioskError::Config(format!(
                "models.nms_iou must be within [0, 1], got {}",
                self.models.nms_iou
            )));
        }
        if self.camera.width == 0 || self.camera.height == 0 || self.camera.fps == 0 {
            return Err(KioskError::Config(
                "camera width, height and fps must be non-zero".to_string(),
            ));
        }
        self.models.emotion_classes()?;
        Ok(())
    }

    fn rebase_paths(&mut self, path: &Path) {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        self.models.object_detector = join_base(base, &self.models.object_detector);
        if let Some(names) = &mut self.models.object_names {
            *names = join_base(base, names);
        }
        self.models.face_cascade = join_base(base, &self.models.face_cascade);
        self.models.emotion_classifier = join_base(base, &self.models.emotion_classifier);
        self.catalog.path = join_base(base, &self.catalog.path);
        self.logging.file = join_base(base, &self.logging.file);
    }
}

fn join_base(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg = KioskConfig::from_toml("").unwrap();
        assert_eq!(cfg, KioskConfig::default());
        assert_eq!(cfg.catalog.path, PathBuf::from("product_data.csv"));
        assert_eq!(cfg.camera.width, 640);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let cfg = KioskConfig::from_toml(
            r#"
[camera]
index = 2

[models]
detection_confidence = 0.5
"#,
        )
        .unwrap();
        assert_eq!(cfg.camera.index, 2);
        assert_eq!(cfg.camera.fps, 30);
        assert_eq!(cfg.models.detection_confidence, 0.5);
        assert_eq!(cfg.models.nms_iou, 0.45);
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let err = KioskConfig::from_toml("[models]\nnms_iou = 1.5\n").unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }

    #[test]
    fn test_emotion_labels_default_to_classifier_order() {
        let cfg = KioskConfig::default();
        assert_eq!(cfg.models.emotion_classes().unwrap(), EMOTION_CLASSES.to_vec());
    }

    #[test]
    fn test_emotion_labels_override() {
        let cfg = KioskConfig::from_toml(
            "[models]\nemotion_labels = [\"Anger\", \"happiness\", \"Curious\", \"neutral\"]\n",
        )
        .unwrap();
        assert_eq!(
            cfg.models.emotion_classes().unwrap(),
            vec![
                Emotion::Angry,
                Emotion::Happy,
                Emotion::Curious,
                Emotion::Neutral,
            ]
        );
    }

    #[test]
    fn test_unknown_emotion_label_rejected() {
        let err = KioskConfig::from_toml("[models]\nemotion_labels = [\"happy\", \"bored\"]\n")
            .unwrap_err();
        assert!(matches!(err, KioskError::Config(ref msg) if msg.contains("bored")));

        let err = KioskConfig::from_toml("[models]\nemotion_labels = []\n").unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = KioskConfig::from_toml("[camera\nindex = ").unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }

    #[test]
    fn test_load_rebases_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kiosk.toml");
        fs::write(
            &path,
            "[catalog]\npath = \"data/products.csv\"\n[models]\nface_cascade = \"/abs/cascade.xml\"\n",
        )
        .unwrap();

        let cfg = KioskConfig::load(&path).unwrap();
        assert_eq!(cfg.catalog.path, dir.path().join("data/products.csv"));
        assert_eq!(cfg.models.face_cascade, PathBuf::from("/abs/cascade.xml"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = KioskConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, KioskConfig::default());
    }
}
