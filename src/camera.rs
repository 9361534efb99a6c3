// Camera module for webcam capture

use crate::config::CameraConfig;
use crate::error::{KioskError, Result};
use crate::models::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use tracing::{error, info};

/// Anything that yields frames one at a time
pub trait FrameSource {
    /// Blocks until the next frame is available
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Acquires a frame source when the camera is switched on.
///
/// The returned source owns the device; dropping it releases the device.
pub trait CameraOpener {
    type Source: FrameSource;

    fn open(&mut self) -> Result<Self::Source>;
}

/// An open webcam stream
pub struct CameraManager {
    camera: Camera,
}

impl CameraManager {
    /// Opens the device and starts its stream
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::YUYV,
            config.fps,
        );
        let requested_format =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let index = CameraIndex::Index(config.index);
        let mut camera = Camera::new(index, requested_format).map_err(|e| {
            error!("Failed to open camera {}: {}", config.index, e);
            KioskError::CameraOpen(format!(
                "Could not open camera {}. Check that it is connected, not in use \
                 and that camera permissions are granted: {e}",
                config.index
            ))
        })?;

        camera.open_stream().map_err(|e| {
            error!("Failed to open camera stream: {}", e);
            KioskError::CameraOpen(format!("Camera stream could not be started: {e}"))
        })?;

        info!(
            "Camera {} opened at {}x{}",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );
        Ok(Self { camera })
    }

    /// Lists available camera devices
    pub fn list_devices() -> Result<Vec<String>> {
        let devices = nokhwa::query(nokhwa::utils::ApiBackend::Auto)?;

        Ok(devices
            .iter()
            .map(|info| info.human_name().to_string())
            .collect())
    }
}

impl FrameSource for CameraManager {
    fn read_frame(&mut self) -> Result<Frame> {
        let frame_data = self
            .camera
            .frame()
            .map_err(|e| KioskError::FrameCapture(e.to_string()))?;

        let buffer = frame_data
            .decode_image::<RgbFormat>()
            .map_err(|e| KioskError::FrameCapture(format!("Failed to decode frame: {e}")))?;

        let (width, height) = (buffer.width(), buffer.height());
        Ok(Frame::new(buffer.into_raw(), width, height))
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        } else {
            info!("Camera released");
        }
    }
}

/// Opens the configured webcam through nokhwa
pub struct WebcamOpener {
    config: CameraConfig,
}

impl WebcamOpener {
    /// Creates an opener for the configured device
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }
}

impl CameraOpener for WebcamOpener {
    type Source = CameraManager;

    fn open(&mut self) -> Result<CameraManager> {
        CameraManager::open(&self.config)
    }
}
