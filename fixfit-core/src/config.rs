//! Analysis client configuration

use crate::error::{AnalysisError, CoreResult};
use std::time::Duration;

/// Environment variable selecting the analysis service base address
pub const API_URL_ENV: &str = "FIXFIT_API_URL";

/// Base address used when no configuration is present
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Analysis client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service base address, without trailing slash
    pub base_url: String,
    /// Timeout for analysis and reset calls
    pub request_timeout: Duration,
    /// Timeout for the health probe
    pub health_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(5),
            health_timeout: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    /// Configuration for the given base address with default timeouts
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Read the base address from `FIXFIT_API_URL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the base address through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_URL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            Some(url) => Self::with_base_url(url),
            None => Self::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.base_url.is_empty() {
            return Err(AnalysisError::InvalidConfiguration {
                message: "Base URL must not be empty".to_string(),
            });
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AnalysisError::InvalidConfiguration {
                message: format!("Base URL must be http(s): {}", self.base_url),
            });
        }

        if self.request_timeout.is_zero() || self.health_timeout.is_zero() {
            return Err(AnalysisError::InvalidConfiguration {
                message: "Timeouts must be > 0".to_string(),
            });
        }

        Ok(())
    }

    /// Full URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides_base_url() {
        let config = ClientConfig::from_lookup(|key| {
            assert_eq!(key, API_URL_ENV);
            Some("https://analysis.example.com/ ".to_string())
        });
        assert_eq!(config.base_url, "https://analysis.example.com");
        assert_eq!(
            config.endpoint("/api/v1/reset"),
            "https://analysis.example.com/api/v1/reset"
        );
    }

    #[test]
    fn test_blank_lookup_uses_default() {
        let config = ClientConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config, ClientConfig::default());

        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_validation() {
        let config = ClientConfig::with_base_url("ftp://example.com");
        assert!(config.validate().is_err());

        let config = ClientConfig {
            request_timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfiguration { .. })
        ));
    }
}
