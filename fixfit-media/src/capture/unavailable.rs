//! Backend for builds without camera support
//!
//! Every open fails with [`MediaError::DeviceUnavailable`], so sessions come
//! up in their no-capture mode instead of streaming anything.

use super::{CaptureBackend, CaptureConstraints, CaptureStream, VideoDevice};
use crate::error::{MediaError, MediaResult};

/// Reason reported when camera support is not compiled in
pub const NO_CAMERA_SUPPORT: &str = "built without native-camera support";

/// Capture backend with no cameras behind it
#[derive(Debug, Default)]
pub struct UnavailableBackend;

impl UnavailableBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn list_devices(&self) -> MediaResult<Vec<VideoDevice>> {
        Ok(Vec::new())
    }

    fn open(&self, _constraints: &CaptureConstraints) -> MediaResult<Box<dyn CaptureStream>> {
        Err(MediaError::DeviceUnavailable {
            reason: NO_CAMERA_SUPPORT.to_string(),
        })
    }
}
