//! Media error types and handling
//!
//! This module defines the error types used by camera acquisition and frame
//! encoding.

use thiserror::Error;

/// Main error type for media operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Camera could not be acquired; capture is unavailable for this session
    #[error("Camera unavailable: {reason}")]
    DeviceUnavailable {
        /// Failure reason
        reason: String,
    },

    /// Camera access was refused by the platform or the user
    #[error("Permission denied: {operation}")]
    PermissionDenied {
        /// Operation that was denied
        operation: String,
    },

    /// Device not found error
    #[error("Device not found: {device_id}")]
    DeviceNotFound {
        /// Device identifier
        device_id: String,
    },

    /// Device enumeration failed
    #[error("Device enumeration failed: {reason}")]
    DeviceEnumerationFailed {
        /// Failure reason
        reason: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Invalid frame data error
    #[error("Invalid frame data: expected {expected} bytes, got {actual}")]
    InvalidFrameData {
        /// Expected data size
        expected: usize,
        /// Actual data size
        actual: usize,
    },

    /// Encoding operation failed
    #[error("Encoding failed: {format} - {reason}")]
    EncodingFailed {
        /// Image format name
        format: String,
        /// Failure reason
        reason: String,
    },
}

/// Result type alias for media operations
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MediaError::DeviceUnavailable { .. } => false,
            MediaError::PermissionDenied { .. } => false,
            MediaError::DeviceNotFound { .. } => false,
            MediaError::DeviceEnumerationFailed { .. } => true,
            MediaError::InvalidConfiguration { .. } => false,
            MediaError::InvalidFrameData { .. } => true,
            MediaError::EncodingFailed { .. } => true,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            MediaError::DeviceUnavailable { .. } => ErrorCategory::Device,
            MediaError::PermissionDenied { .. } => ErrorCategory::System,
            MediaError::DeviceNotFound { .. } => ErrorCategory::Device,
            MediaError::DeviceEnumerationFailed { .. } => ErrorCategory::Device,
            MediaError::InvalidConfiguration { .. } => ErrorCategory::Configuration,
            MediaError::InvalidFrameData { .. } => ErrorCategory::Data,
            MediaError::EncodingFailed { .. } => ErrorCategory::Codec,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// System-level errors (permissions, etc.)
    System,
    /// Configuration and parameter errors
    Configuration,
    /// Image codec errors
    Codec,
    /// Data validation errors
    Data,
    /// Device and hardware errors
    Device,
}
