// Kiosk tick loop: camera ownership, perception and the session

use crate::camera::{CameraOpener, FrameSource};
use crate::error::{Result, SessionError};
use crate::models::{Frame, Observation};
use crate::perception::Perception;
use crate::session::{Answer, Session, SessionEvent, SessionState};
use tracing::{debug, error, info, warn};

/// A message for the viewer about something that went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The current attempt failed and the viewer has to act
    Error(String),
    /// Streaming ended early
    Warning(String),
}

/// Everything the display needs from one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub frame: Frame,
    pub observation: Observation,
    pub events: Vec<SessionEvent>,
}

/// Holds the camera only while the session has it switched on
pub struct Kiosk<O: CameraOpener, P: Perception> {
    opener: O,
    perception: P,
    session: Session,
    camera: Option<O::Source>,
    notice: Option<Notice>,
}

impl<O: CameraOpener, P: Perception> Kiosk<O, P> {
    /// Creates a kiosk with the camera off and an idle session
    pub fn new(opener: O, perception: P) -> Self {
        Self {
            opener,
            perception,
            session: Session::new(),
            camera: None,
            notice: None,
        }
    }

    /// Current session state for display
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Latest error or warning, if any
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True while the device is held
    pub fn camera_held(&self) -> bool {
        self.camera.is_some()
    }

    /// Acquires the camera and starts a fresh session.
    ///
    /// On failure the error is kept as a notice and the session is left
    /// exactly as it was; there is no retry.
    pub fn start_camera(&mut self) -> Result<()> {
        if self.camera.is_some() {
            return Ok(());
        }
        match self.opener.open() {
            Ok(source) => {
                self.camera = Some(source);
                self.notice = None;
                self.session.start_camera();
                Ok(())
            }
            Err(e) => {
                error!("Camera start failed: {}", e);
                self.notice = Some(Notice::Error(format!(
                    "Camera could not be opened. Please check permissions and try again. ({e})"
                )));
                Err(e)
            }
        }
    }

    /// Releases the camera; exploration flags stay as they are
    pub fn stop_camera(&mut self) {
        self.release_camera();
        self.session.stop_camera();
    }

    /// Start when off, stop when on
    pub fn toggle_camera(&mut self) -> Result<()> {
        if self.session.camera_active() {
            self.stop_camera();
            Ok(())
        } else {
            self.start_camera()
        }
    }

    /// Forwards the viewer's answer; a resolved session no longer needs the camera
    pub fn answer(&mut self, answer: Answer) -> std::result::Result<SessionState, SessionError> {
        let state = self.session.answer(answer)?;
        self.release_camera();
        Ok(state)
    }

    /// Runs one capture → perception → session step.
    ///
    /// Returns `None` when the camera is off or the frame read failed; a
    /// failed read ends streaming like a manual stop.
    pub fn tick(&mut self) -> Option<TickReport> {
        if !self.session.camera_active() {
            self.release_camera();
            return None;
        }

        let Some(camera) = self.camera.as_mut() else {
            warn!("Session active without a camera, stopping");
            self.session.stop_camera();
            return None;
        };

        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed, stopping camera: {}", e);
                self.notice = Some(Notice::Warning(format!(
                    "Failed to capture frame. Please check your camera connection. ({e})"
                )));
                self.stop_camera();
                return None;
            }
        };

        let observation = self.perception.observe(&frame);
        let events = self.session.tick(&observation);
        debug!(
            "Tick: {} objects, emotion {:?}, {} events",
            observation.objects.len(),
            observation.emotion,
            events.len()
        );

        Some(TickReport {
            frame,
            observation,
            events,
        })
    }

    fn release_camera(&mut self) {
        if self.camera.take().is_some() {
            info!("Camera handle dropped");
        }
    }
}
