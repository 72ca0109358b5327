//! Service configuration
//!
//! Connection settings for one remote service. Passed to a client at
//! construction; clients never read configuration from anywhere else.

use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default timeout for a single HTTP call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a remote service
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Base URL of the service API (e.g., "https://api.fashn.ai")
    pub base_url: String,

    /// API key or token sent with every request
    pub api_key: String,

    /// Timeout applied to every HTTP call made with this config
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Creates a new configuration with the default request timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(
                "base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.api_key.trim().is_empty() {
            return Err(ClientError::InvalidConfig(
                "api_key cannot be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
