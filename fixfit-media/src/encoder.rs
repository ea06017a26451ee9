//! Frame encoding
//!
//! Turns the current camera frame into a self-describing image payload: a
//! compressed still at the stream's native resolution, wrapped in a
//! `data:<mime>;base64,` URI and stamped with the capture time.

use crate::device::CameraSession;
use crate::error::{MediaError, MediaResult};
use crate::tracks::VideoFrame;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::trace;

/// Default lossy quality, on a 0-1 scale
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Prefix shared by every base64 data URI
const DATA_URI_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Still image formats the encoder can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
        }
    }

    /// Whether [`EncoderConfig::quality`] applies to this format
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageFormat::Jpeg)
    }
}

/// Encoder configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub format: ImageFormat,
    /// Lossy quality in `(0.0, 1.0]`; ignored for lossless formats
    pub quality: f32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> MediaResult<()> {
        if !self.quality.is_finite() || self.quality <= 0.0 || self.quality > 1.0 {
            return Err(MediaError::InvalidConfiguration {
                message: format!("Encoder quality must be in (0, 1], got {}", self.quality),
            });
        }
        Ok(())
    }

    /// Quality on the 1-100 scale the JPEG encoder takes
    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// One encoded frame, ready to be sent for analysis
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFrame {
    data_uri: String,
    timestamp_ms: i64,
    width: u32,
    height: u32,
    format: ImageFormat,
    size_bytes: usize,
}

impl EncodedFrame {
    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Length of the data URI in bytes, as sent on the wire
    pub fn len(&self) -> usize {
        self.data_uri.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_uri.is_empty()
    }

    /// Capture time in milliseconds since the Unix epoch
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size of the compressed image before base64 expansion
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

/// Encodes camera frames into data URIs
#[derive(Debug, Clone, Default)]
pub struct FrameEncoder {
    config: EncoderConfig,
}

impl FrameEncoder {
    pub fn new(config: EncoderConfig) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode the session's current frame, stamped with the current time.
    ///
    /// Returns `Ok(None)` when the session is not active or the camera has
    /// not produced its first frame yet.
    pub fn encode(&self, session: &CameraSession) -> MediaResult<Option<EncodedFrame>> {
        let Some(frame) = session.current_frame() else {
            trace!(session_id = %session.id(), "No frame available to encode");
            return Ok(None);
        };

        self.encode_now(&frame).map(Some)
    }

    /// Encode a frame already taken from a session, stamped with the current time
    pub fn encode_now(&self, frame: &VideoFrame) -> MediaResult<EncodedFrame> {
        self.encode_frame(frame, chrono::Utc::now().timestamp_millis())
    }

    /// Encode a single frame at its own dimensions
    pub fn encode_frame(&self, frame: &VideoFrame, timestamp_ms: i64) -> MediaResult<EncodedFrame> {
        if !frame.is_well_formed() {
            return Err(MediaError::InvalidFrameData {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }

        let format = self.config.format;
        let image = RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(|| MediaError::InvalidFrameData {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            })?;

        let mut compressed = Vec::new();
        let result = match format {
            ImageFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut compressed, self.config.jpeg_quality())
                    .encode_image(&image)
            }
            ImageFormat::Png => PngEncoder::new(&mut compressed).write_image(
                image.as_raw(),
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            ),
        };
        result.map_err(|e| MediaError::EncodingFailed {
            format: format.name().to_string(),
            reason: e.to_string(),
        })?;

        let size_bytes = compressed.len();
        trace!(
            width = frame.width,
            height = frame.height,
            size_bytes,
            format = format.name(),
            "Encoded frame"
        );

        Ok(EncodedFrame {
            data_uri: to_data_uri(format.mime_type(), &compressed),
            timestamp_ms,
            width: frame.width,
            height: frame.height,
            format,
            size_bytes,
        })
    }
}

/// Wrap bytes in a base64 data URI
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "{}{}{}{}",
        DATA_URI_SCHEME,
        mime_type,
        BASE64_MARKER,
        STANDARD.encode(bytes)
    )
}

/// Split a base64 data URI into its MIME type and decoded bytes
pub fn parse_data_uri(uri: &str) -> MediaResult<(String, Vec<u8>)> {
    let invalid = |reason: &str| MediaError::EncodingFailed {
        format: "data URI".to_string(),
        reason: reason.to_string(),
    };

    let rest = uri
        .strip_prefix(DATA_URI_SCHEME)
        .ok_or_else(|| invalid("missing data: scheme"))?;
    let (mime_type, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| invalid("not base64 encoded"))?;
    if mime_type.is_empty() {
        return Err(invalid("missing MIME type"));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| invalid(&e.to_string()))?;
    Ok((mime_type.to_string(), bytes))
}
