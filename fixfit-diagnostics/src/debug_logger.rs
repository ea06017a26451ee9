//! Structured debug logging setup

use fixfit_core::{AnalysisError, CoreResult};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "info";

/// Installs the process-wide tracing subscriber
#[derive(Debug, Default)]
pub struct DebugLogger;

impl DebugLogger {
    /// Initialize logging from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
    ///
    /// Returns `Ok(false)` if a subscriber was already installed.
    pub fn init_logging() -> CoreResult<bool> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
            .map_err(|e| AnalysisError::InvalidConfiguration {
                message: format!("Invalid log filter: {}", e),
            })?;
        Self::install(filter)
    }

    /// Initialize logging with explicit filter directives, ignoring `RUST_LOG`
    pub fn init_with_filter(directives: &str) -> CoreResult<bool> {
        let filter =
            EnvFilter::try_new(directives).map_err(|e| AnalysisError::InvalidConfiguration {
                message: format!("Invalid log filter '{}': {}", directives, e),
            })?;
        Self::install(filter)
    }

    fn install(filter: EnvFilter) -> CoreResult<bool> {
        match tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
        {
            Ok(()) => {
                tracing::debug!("Logging initialized");
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

/// Shorthand for [`DebugLogger::init_logging`]
pub fn init_logging() -> CoreResult<bool> {
    DebugLogger::init_logging()
}
