//! Capture backends
//!
//! A backend opens a camera under a set of constraints and hands back a
//! [`CaptureStream`] that owns the live tracks. The device manager is the only
//! caller; it wraps the stream in a `CameraSession`.

#[cfg(feature = "native-camera")]
pub mod native;
pub mod synthetic;
pub mod unavailable;

use crate::error::MediaResult;
use crate::tracks::{TrackInfo, VideoFrame};

pub use synthetic::{SyntheticBackend, SyntheticStats};
pub use unavailable::{UnavailableBackend, NO_CAMERA_SUPPORT};

/// Video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl VideoResolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const VGA: Self = Self::new(640, 480);
    pub const HD: Self = Self::new(1280, 720);

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Preferred camera orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Camera facing the user
    Front,
    /// Camera facing away from the user
    Back,
}

/// What the caller asks the platform for when opening a camera.
///
/// The resolution is an ideal, not a requirement: backends pick the closest
/// mode the device supports and report it through [`CaptureStream::resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub ideal_resolution: VideoResolution,
    pub facing: FacingMode,
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_resolution: VideoResolution::VGA,
            facing: FacingMode::Front,
            audio: false,
        }
    }
}

/// Video device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub id: String,
    pub name: String,
    pub description: String,
    pub facing: Option<FacingMode>,
}

/// Opens cameras. Implementations must be cheap to share across tasks.
pub trait CaptureBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    fn list_devices(&self) -> MediaResult<Vec<VideoDevice>>;

    /// Open a stream. This is the only call that activates camera hardware.
    fn open(&self, constraints: &CaptureConstraints) -> MediaResult<Box<dyn CaptureStream>>;
}

/// A live camera stream and its tracks
pub trait CaptureStream: Send {
    /// Device the stream was opened on
    fn device(&self) -> &VideoDevice;

    /// Native resolution negotiated with the device
    fn resolution(&self) -> VideoResolution;

    /// Most recent decoded frame, or `None` until the first one is available
    fn latest_frame(&self) -> Option<VideoFrame>;

    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every track. Calling it again has no effect.
    fn stop(&mut self);
}

/// Backend used when the caller does not supply one.
///
/// Without the `native-camera` feature there is no camera to open, and the
/// returned backend reports every open as unavailable.
pub fn default_backend() -> std::sync::Arc<dyn CaptureBackend> {
    #[cfg(feature = "native-camera")]
    {
        std::sync::Arc::new(native::NokhwaBackend::new())
    }
    #[cfg(not(feature = "native-camera"))]
    {
        std::sync::Arc::new(UnavailableBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints() {
        let constraints = CaptureConstraints::default();
        assert_eq!(constraints.ideal_resolution, VideoResolution::new(640, 480));
        assert_eq!(constraints.facing, FacingMode::Front);
        assert!(!constraints.audio);
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(VideoResolution::VGA.to_string(), "640x480");
        assert_eq!(VideoResolution::VGA.pixel_count(), 307_200);
        assert!(VideoResolution::new(0, 480).is_empty());
    }

    #[cfg(not(feature = "native-camera"))]
    #[test]
    fn test_default_backend_has_no_camera() {
        let backend = default_backend();
        assert_eq!(backend.name(), "unavailable");
        assert!(matches!(
            backend.open(&CaptureConstraints::default()),
            Err(crate::MediaError::DeviceUnavailable { .. })
        ));
    }
}
