//! Camera acquisition and release
//!
//! [`CaptureDeviceManager`] opens the camera through a [`CaptureBackend`] and
//! hands out a [`CameraSession`]. The session owns the stream: dropping it, or
//! calling [`CameraSession::release`] any number of times, stops every track
//! exactly once and detaches the preview surface.

use crate::capture::{
    default_backend, CaptureBackend, CaptureConstraints, CaptureStream, VideoDevice,
    VideoResolution,
};
use crate::error::{MediaError, MediaResult};
use crate::surface::{HeadlessSurface, PreviewSurface};
use crate::tracks::{TrackInfo, VideoFrame};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No camera has been acquired
    Uninitialized,
    /// Camera open and attached to the preview surface
    Active,
    /// Tracks stopped; the session cannot be reused
    Released,
}

/// Device events
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    DeviceAcquired {
        session_id: Uuid,
        device_name: String,
        resolution: VideoResolution,
    },
    DeviceUnavailable {
        reason: String,
    },
    SessionReleased {
        session_id: Uuid,
    },
}

/// An acquired camera stream bound to a preview surface
pub struct CameraSession {
    id: Uuid,
    status: SessionStatus,
    stream: Option<Box<dyn CaptureStream>>,
    surface: Option<Arc<dyn PreviewSurface>>,
    event_tx: Option<broadcast::Sender<CaptureEvent>>,
}

impl Default for CameraSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("device", &self.device().map(|d| d.name.as_str()))
            .finish()
    }
}

impl CameraSession {
    /// Session with no camera behind it
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Uninitialized,
            stream: None,
            surface: None,
            event_tx: None,
        }
    }

    fn active(
        stream: Box<dyn CaptureStream>,
        surface: Arc<dyn PreviewSurface>,
        event_tx: broadcast::Sender<CaptureEvent>,
    ) -> Self {
        let id = Uuid::new_v4();
        surface.attach(id, stream.device(), stream.resolution());

        Self {
            id,
            status: SessionStatus::Active,
            stream: Some(stream),
            surface: Some(surface),
            event_tx: Some(event_tx),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn device(&self) -> Option<&VideoDevice> {
        self.stream.as_ref().map(|stream| stream.device())
    }

    /// Native resolution of the stream, if one is open
    pub fn resolution(&self) -> Option<VideoResolution> {
        self.stream.as_ref().map(|stream| stream.resolution())
    }

    /// Latest frame from the camera; `None` when not active or not warmed up
    pub fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_active() {
            return None;
        }
        self.stream.as_ref().and_then(|stream| stream.latest_frame())
    }

    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.stream
            .as_ref()
            .map(|stream| stream.tracks())
            .unwrap_or_default()
    }

    /// Stop every track and detach from the surface.
    ///
    /// Returns `true` if this call released the camera, `false` if there was
    /// nothing to release.
    pub fn release(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }

        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
        if let Some(surface) = self.surface.take() {
            surface.detach(self.id);
        }
        self.status = SessionStatus::Released;

        if let Some(event_tx) = &self.event_tx {
            let _ = event_tx.send(CaptureEvent::SessionReleased { session_id: self.id });
        }
        info!(session_id = %self.id, "Camera session released");
        true
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Acquires cameras under a fixed set of constraints
pub struct CaptureDeviceManager {
    backend: Arc<dyn CaptureBackend>,
    constraints: CaptureConstraints,
    surface: Arc<dyn PreviewSurface>,
    event_tx: broadcast::Sender<CaptureEvent>,
}

impl Default for CaptureDeviceManager {
    fn default() -> Self {
        Self::new(default_backend())
    }
}

impl CaptureDeviceManager {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            backend,
            constraints: CaptureConstraints::default(),
            surface: Arc::new(HeadlessSurface::new()),
            event_tx,
        }
    }

    pub fn with_constraints(mut self, constraints: CaptureConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_surface(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn list_devices(&self) -> MediaResult<Vec<VideoDevice>> {
        self.backend.list_devices()
    }

    /// Open the camera and attach it to the preview surface.
    ///
    /// Any failure, including a refused permission prompt, is reported as
    /// [`MediaError::DeviceUnavailable`] and no session is returned.
    pub async fn acquire(&self) -> MediaResult<CameraSession> {
        if self.constraints.ideal_resolution.is_empty() {
            return Err(self.unavailable(format!(
                "invalid ideal resolution {}",
                self.constraints.ideal_resolution
            )));
        }

        let backend = self.backend.clone();
        let constraints = self.constraints.clone();
        debug!(backend = backend.name(), "Acquiring camera");

        // Opening may block on the platform permission prompt
        let opened = tokio::task::spawn_blocking(move || backend.open(&constraints))
            .await
            .map_err(|e| MediaError::DeviceUnavailable {
                reason: format!("camera open task failed: {}", e),
            })?;

        let stream = match opened {
            Ok(stream) => stream,
            Err(MediaError::DeviceUnavailable { reason }) => return Err(self.unavailable(reason)),
            Err(e) => return Err(self.unavailable(e.to_string())),
        };

        let session = CameraSession::active(stream, self.surface.clone(), self.event_tx.clone());
        let device_name = session
            .device()
            .map(|device| device.name.clone())
            .unwrap_or_default();
        let resolution = session.resolution().unwrap_or(self.constraints.ideal_resolution);

        info!(
            session_id = %session.id(),
            device = %device_name,
            resolution = %resolution,
            "Camera acquired"
        );
        let _ = self.event_tx.send(CaptureEvent::DeviceAcquired {
            session_id: session.id(),
            device_name,
            resolution,
        });

        Ok(session)
    }

    /// Release a session. Safe to call on sessions that are already released.
    pub fn release(&self, session: &mut CameraSession) -> bool {
        session.release()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.event_tx.subscribe()
    }

    fn unavailable(&self, reason: String) -> MediaError {
        warn!(backend = self.backend.name(), reason = %reason, "Camera unavailable");
        let _ = self.event_tx.send(CaptureEvent::DeviceUnavailable {
            reason: reason.clone(),
        });
        MediaError::DeviceUnavailable { reason }
    }
}
