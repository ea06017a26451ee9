//! Top-level error type

use fixfit_core::AnalysisError;
use fixfit_media::MediaError;
use thiserror::Error;

/// Errors surfaced by the live session API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixFitError {
    /// Camera acquisition or frame encoding failed
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Analysis service call failed
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Result type alias for live session operations
pub type FixFitResult<T> = Result<T, FixFitError>;

impl FixFitError {
    /// Whether the next capture tick may succeed without intervention
    pub fn is_recoverable(&self) -> bool {
        match self {
            FixFitError::Media(e) => e.is_recoverable(),
            FixFitError::Analysis(e) => e.is_recoverable(),
            FixFitError::InvalidConfiguration { .. } => false,
        }
    }
}
