//! Configuration types and defaults

use crate::{FixFitError, FixFitResult};
use fixfit_core::ClientConfig;
use fixfit_media::{CaptureConstraints, EncoderConfig, FacingMode, ImageFormat, VideoResolution};
use std::time::Duration;

/// Default time between capture ticks (10 samples per second)
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_millis(100);

/// Camera capture and frame encoding settings
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Time between capture ticks
    pub interval: Duration,
    /// Ideal camera resolution; the device may negotiate another
    pub resolution: VideoResolution,
    /// Preferred camera orientation
    pub facing: FacingMode,
    /// Still image format sent for analysis
    pub image_format: ImageFormat,
    /// Lossy quality in `(0.0, 1.0]`
    pub quality: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CAPTURE_INTERVAL,
            resolution: VideoResolution::VGA,
            facing: FacingMode::Front,
            image_format: ImageFormat::Jpeg,
            quality: fixfit_media::DEFAULT_QUALITY,
        }
    }
}

impl CaptureConfig {
    /// Validate configuration
    pub fn validate(&self) -> FixFitResult<()> {
        if self.interval.is_zero() {
            return Err(FixFitError::InvalidConfiguration {
                message: "Capture interval must be greater than zero".to_string(),
            });
        }
        if self.resolution.is_empty() {
            return Err(FixFitError::InvalidConfiguration {
                message: format!("Invalid capture resolution {}", self.resolution),
            });
        }
        self.encoder_config().validate()?;
        Ok(())
    }

    /// Constraints handed to the camera backend
    pub fn constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            ideal_resolution: self.resolution,
            facing: self.facing,
            audio: false,
        }
    }

    /// Settings handed to the frame encoder
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            format: self.image_format,
            quality: self.quality,
        }
    }
}

/// Global FixFit configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalConfig {
    /// Analysis service client settings
    pub client: ClientConfig,
    /// Capture settings
    pub capture: CaptureConfig,
    /// Install a tracing subscriber when a session is built
    pub debug_logging: bool,
}

impl GlobalConfig {
    /// Defaults, with the service address taken from `FIXFIT_API_URL`
    pub fn from_env() -> Self {
        Self {
            client: ClientConfig::from_env(),
            ..Self::default()
        }
    }

    /// Validate every section
    pub fn validate(&self) -> FixFitResult<()> {
        self.client.validate()?;
        self.capture.validate()
    }
}
