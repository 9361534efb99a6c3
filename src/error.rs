// Error types for the EmotiCart kiosk

use thiserror::Error;

/// Main error type for the kiosk application
#[derive(Debug, Error)]
pub enum KioskError {
    #[error("Camera could not be opened: {0}")]
    CameraOpen(String),

    #[error("Failed to capture frame: {0}")]
    FrameCapture(String),

    #[error("Frame processing failed: {0}")]
    FrameProcessing(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Object detection failed: {0}")]
    ObjectDetection(String),

    #[error("Face detection failed: {0}")]
    FaceDetection(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),

    #[error("OpenCV error: {0}")]
    OpenCV(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for kiosk operations
pub type Result<T> = std::result::Result<T, KioskError>;

// Conversion from nokhwa errors
impl From<nokhwa::NokhwaError> for KioskError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        match err {
            nokhwa::NokhwaError::OpenDeviceError(device, error) => {
                KioskError::CameraOpen(format!("Device {device}: {error}"))
            }
            nokhwa::NokhwaError::OpenStreamError(error) => {
                KioskError::CameraOpen(format!("Stream: {error}"))
            }
            nokhwa::NokhwaError::ReadFrameError(error) => KioskError::FrameCapture(error),
            _ => KioskError::CameraOpen(err.to_string()),
        }
    }
}

// Conversion from OpenCV errors
impl From<opencv::Error> for KioskError {
    fn from(err: opencv::Error) -> Self {
        KioskError::OpenCV(err.to_string())
    }
}

// Conversion from ONNX Runtime errors
impl From<ort::Error> for KioskError {
    fn from(err: ort::Error) -> Self {
        KioskError::OnnxRuntime(err.to_string())
    }
}

impl From<csv::Error> for KioskError {
    fn from(err: csv::Error) -> Self {
        KioskError::Catalog(err.to_string())
    }
}

impl From<toml::de::Error> for KioskError {
    fn from(err: toml::de::Error) -> Self {
        KioskError::Config(err.to_string())
    }
}

/// Misuse of the suggestion session, e.g. answering a prompt nobody asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No exploration prompt is awaiting an answer")]
    NotAwaitingAnswer,
}
