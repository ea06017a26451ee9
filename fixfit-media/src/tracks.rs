//! Track abstractions and media frame types

use bytes::Bytes;

/// Bytes per pixel of a decoded RGB24 frame
pub const RGB24_BYTES_PER_PIXEL: usize = 3;

/// Decoded video frame at the source's native dimensions
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Packed RGB24 pixel data, row-major
    pub data: Bytes,
    /// Time the source produced the frame, milliseconds since epoch
    pub timestamp: i64,
}

impl VideoFrame {
    /// Number of bytes an RGB24 frame of this size must carry
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * RGB24_BYTES_PER_PIXEL
    }

    /// Whether the pixel buffer matches the declared dimensions
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.expected_len()
    }
}

/// Lifecycle of a single media track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Producing media
    Live,
    /// Stopped; will not produce again
    Ended,
}

/// Snapshot of one video track belonging to a capture stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Track label, usually the device name
    pub label: String,
    /// Current state
    pub state: TrackState,
}

impl TrackInfo {
    /// Live video track
    pub fn video(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: TrackState::Live,
        }
    }

    /// Mark the track as ended
    pub fn end(&mut self) {
        self.state = TrackState::Ended;
    }
}
