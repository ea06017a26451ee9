//! HTTP client for the remote analysis service
//!
//! [`AnalysisService`] is the seam the session coordinator talks to;
//! [`HttpAnalysisClient`] is the production implementation over `reqwest`.

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::config::ClientConfig;
use crate::error::{AnalysisError, CoreResult};
use async_trait::async_trait;
use tracing::{debug, trace, warn};

/// Frame analysis endpoint
pub const ANALYZE_PATH: &str = "/api/v1/analyze-frame";
/// Server-side session reset endpoint
pub const RESET_PATH: &str = "/api/v1/reset";
/// Liveness endpoint
pub const HEALTH_PATH: &str = "/health";

/// Remote analysis operations
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Analyse one encoded frame captured at `timestamp` (ms since epoch)
    async fn analyze(&self, frame_data: &str, timestamp: i64) -> CoreResult<AnalysisResult>;

    /// Clear the remote phase and rep state
    async fn reset_session(&self) -> CoreResult<()>;

    /// Probe liveness. Never fails; any error counts as unhealthy.
    async fn check_health(&self) -> bool;
}

/// `reqwest`-backed analysis client
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpAnalysisClient {
    /// Create a client for the given configuration
    pub fn new(config: ClientConfig) -> CoreResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AnalysisError::InvalidConfiguration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { http, config })
    }

    /// Create a client from `FIXFIT_API_URL`, falling back to the local default
    pub fn from_env() -> CoreResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn analyze(&self, frame_data: &str, timestamp: i64) -> CoreResult<AnalysisResult> {
        let request = AnalysisRequest::new(frame_data, timestamp)?;
        let url = self.config.endpoint(ANALYZE_PATH);

        trace!(url = %url, timestamp, bytes = request.frame_data.len(), "Sending frame");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            // The error body is optional; an unreadable one is treated as absent.
            let body = response.bytes().await.unwrap_or_default();
            let error = AnalysisError::rejected(status.as_u16(), &body);
            debug!(status = status.as_u16(), error = %error, "Analysis rejected");
            return Err(error);
        }

        let body = response.bytes().await.map_err(transport_failure)?;
        let result: AnalysisResult =
            serde_json::from_slice(&body).map_err(|e| AnalysisError::MalformedResponse {
                reason: e.to_string(),
            })?;
        result.validate()?;

        Ok(result)
    }

    async fn reset_session(&self) -> CoreResult<()> {
        let url = self.config.endpoint(RESET_PATH);

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::TransportFailure {
                reason: format!("Reset failed: {}", status.as_u16()),
            });
        }

        debug!("Remote session reset");
        Ok(())
    }

    async fn check_health(&self) -> bool {
        let url = self.config.endpoint(HEALTH_PATH);

        match self
            .http
            .get(&url)
            .timeout(self.config.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(url = %url, error = %e, "Health check failed");
                false
            }
        }
    }
}

fn transport_failure(error: reqwest::Error) -> AnalysisError {
    if error.is_decode() {
        return AnalysisError::MalformedResponse {
            reason: error.to_string(),
        };
    }

    AnalysisError::TransportFailure {
        reason: error.to_string(),
    }
}
