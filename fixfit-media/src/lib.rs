//! # FixFit Media
//!
//! Camera acquisition and frame encoding for FixFit.
//! This crate owns the camera: it opens a stream under capture constraints,
//! keeps it attached to a preview surface, guarantees release, and turns the
//! current frame into a base64 image data URI.

#![warn(clippy::all)]

pub mod capture;
pub mod device;
pub mod encoder;
pub mod error;
pub mod surface;
pub mod tracks;

// Re-export main types
pub use capture::{
    default_backend, CaptureBackend, CaptureConstraints, CaptureStream, FacingMode,
    SyntheticBackend, SyntheticStats, UnavailableBackend, VideoDevice, VideoResolution,
    NO_CAMERA_SUPPORT,
};
pub use device::{CameraSession, CaptureDeviceManager, CaptureEvent, SessionStatus};
pub use encoder::{
    parse_data_uri, to_data_uri, EncodedFrame, EncoderConfig, FrameEncoder, ImageFormat,
    DEFAULT_QUALITY,
};
pub use error::{ErrorCategory, MediaError, MediaResult};
pub use surface::{Attachment, HeadlessSurface, PreviewSurface};
pub use tracks::{TrackInfo, TrackState, VideoFrame};
