//! Error types for FixFit analysis calls

use thiserror::Error;

/// Main error type for analysis service operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No response was received from the service (unreachable, timed out, reset)
    #[error("Transport failure: {reason}")]
    TransportFailure {
        /// Underlying cause
        reason: String,
    },

    /// The service answered with a non-success status.
    ///
    /// Displays the service-provided detail verbatim.
    #[error("{detail}")]
    AnalysisRejected {
        /// HTTP status code
        status: u16,
        /// Reason reported by the service, or `API error: <status>` when absent
        detail: String,
    },

    /// The response body could not be parsed or violated the result shape
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        /// What was wrong with the body
        reason: String,
    },

    /// The request was rejected locally before being sent
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// Why the request is invalid
        reason: String,
    },

    /// Invalid client configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}

/// Result type alias for analysis operations
pub type CoreResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Build an `AnalysisRejected` from a status code and the raw error body.
    ///
    /// The body may carry `{"detail": "..."}`; anything else falls back to a
    /// generic status message.
    pub fn rejected(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("detail")
                    .and_then(|detail| detail.as_str())
                    .filter(|detail| !detail.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("API error: {}", status));

        AnalysisError::AnalysisRejected { status, detail }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::TransportFailure { .. } => ErrorKind::Transport,
            AnalysisError::AnalysisRejected { .. } => ErrorKind::Rejected,
            AnalysisError::MalformedResponse { .. } => ErrorKind::Malformed,
            AnalysisError::InvalidRequest { .. } => ErrorKind::Request,
            AnalysisError::InvalidConfiguration { .. } => ErrorKind::Configuration,
        }
    }

    /// Whether the error should be presented as a connectivity problem.
    ///
    /// Malformed bodies are displayed the same way as transport failures.
    pub fn is_transport_class(&self) -> bool {
        matches!(
            self,
            AnalysisError::TransportFailure { .. } | AnalysisError::MalformedResponse { .. }
        )
    }

    /// Check if a later attempt may succeed without user intervention
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalysisError::TransportFailure { .. } => true,
            AnalysisError::MalformedResponse { .. } => true,
            AnalysisError::AnalysisRejected { status, .. } => *status >= 500 || *status == 429,
            AnalysisError::InvalidRequest { .. } => false,
            AnalysisError::InvalidConfiguration { .. } => false,
        }
    }
}

/// Error kinds for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure
    Transport,
    /// Service returned a non-success status
    Rejected,
    /// Response shape violation
    Malformed,
    /// Request rejected before sending
    Request,
    /// Configuration problem
    Configuration,
}
