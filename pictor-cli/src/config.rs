//! Configuration module
//!
//! Holds the service credentials and endpoints handed to the CLI and turns
//! them into per-service client configurations.

use anyhow::{Result, bail};
use pictor_client::ServiceConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Clone)]
pub struct Config {
    pub segmind_api_key: Option<String>,
    pub segmind_url: String,
    pub fashn_api_key: Option<String>,
    pub fashn_url: String,
    pub replicate_api_token: Option<String>,
    pub replicate_url: String,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
}

impl Config {
    pub fn segmind(&self) -> Result<ServiceConfig> {
        self.service(&self.segmind_url, self.segmind_api_key.as_deref(), "SEGMIND_API_KEY")
    }

    pub fn fashn(&self) -> Result<ServiceConfig> {
        self.service(&self.fashn_url, self.fashn_api_key.as_deref(), "FASHN_API_KEY")
    }

    pub fn replicate(&self) -> Result<ServiceConfig> {
        self.service(
            &self.replicate_url,
            self.replicate_api_token.as_deref(),
            "REPLICATE_API_TOKEN",
        )
    }

    fn service(&self, url: &str, key: Option<&str>, env_name: &str) -> Result<ServiceConfig> {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            bail!("{} is not set", env_name);
        };

        let config = ServiceConfig::new(url, key).with_request_timeout(self.request_timeout);
        config.validate()?;
        Ok(config)
    }
}
