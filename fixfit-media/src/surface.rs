//! Preview surfaces
//!
//! A camera session is attached to exactly one surface while it is active.
//! The render layer implements [`PreviewSurface`] to show the live stream;
//! [`HeadlessSurface`] is used when nothing is displayed.

use crate::capture::{VideoDevice, VideoResolution};
use parking_lot::Mutex;
use uuid::Uuid;

/// Something that can display a live camera stream
pub trait PreviewSurface: Send + Sync {
    /// Start showing the stream of `session_id`
    fn attach(&self, session_id: Uuid, device: &VideoDevice, resolution: VideoResolution);

    /// Stop showing the stream of `session_id`
    fn detach(&self, session_id: Uuid);
}

/// What a surface is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub session_id: Uuid,
    pub device_name: String,
    pub resolution: VideoResolution,
}

/// Surface that displays nothing but remembers its attachment
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    attached: Mutex<Option<Attachment>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.attached.lock().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.lock().is_some()
    }
}

impl PreviewSurface for HeadlessSurface {
    fn attach(&self, session_id: Uuid, device: &VideoDevice, resolution: VideoResolution) {
        *self.attached.lock() = Some(Attachment {
            session_id,
            device_name: device.name.clone(),
            resolution,
        });
    }

    fn detach(&self, session_id: Uuid) {
        let mut attached = self.attached.lock();
        // A newer session may already own the surface
        if attached.as_ref().map(|a| a.session_id) == Some(session_id) {
            *attached = None;
        }
    }
}
