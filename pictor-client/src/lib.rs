//! Pictor HTTP Client
//!
//! Clients for the remote image services and the driver that waits for their
//! jobs to finish.
//!
//! Every service is exposed through two small traits, [`SubmissionClient`]
//! (start a job, get a [`JobHandle`]) and [`StatusClient`] (read the job's
//! current status payload). [`JobPoller`] drives the poll state machine from
//! `pictor-core` on top of any pair of those.
//!
//! # Example
//!
//! ```no_run
//! use pictor_client::services::fashn::{FashnClient, GarmentCategory, TryOnRequest};
//! use pictor_client::{JobPoller, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FashnClient::new(ServiceConfig::new(FashnClient::DEFAULT_BASE_URL, "fa-key"))?;
//!     let poller = JobPoller::new(FashnClient::default_policy());
//!
//!     let result = poller
//!         .run(&client, &TryOnRequest {
//!             model_image: "https://example.com/model.jpg".to_string(),
//!             garment_image: "https://example.com/shirt.jpg".to_string(),
//!             category: GarmentCategory::Tops,
//!             flat_lay: false,
//!         })
//!         .await?;
//!
//!     println!("Output: {}", result.artifact_url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod poller;
pub mod services;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use error::{ClientError, PollError, Result};
pub use observer::{ProgressEvent, ProgressObserver, TracingObserver};
pub use pictor_core::{JobHandle, JobResult, JobStatus, PollPolicy, ServiceProfile};
pub use poller::{JobPoller, Sleeper, TokioSleeper};
pub use tokio_util::sync::CancellationToken;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Starts jobs on a remote service
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Description of the work to submit
    type Job: Send + Sync;

    /// Submits a job and returns its handle
    ///
    /// Any error here is fatal for the job: nothing was started, so there is
    /// nothing to poll.
    async fn submit(&self, job: &Self::Job) -> Result<JobHandle>;
}

/// Reads the status of jobs on a remote service
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// Vocabulary and payload layout of this service
    fn profile(&self) -> &ServiceProfile;

    /// Fetches the raw status payload for a job
    async fn poll(&self, handle: &JobHandle) -> Result<Value>;
}

/// How a service expects the API key to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// The key as the value of a named header
    Header(&'static str),
}

/// Shared HTTP plumbing for the service clients
///
/// Holds the configuration and a `reqwest` client built with the configured
/// per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpService {
    config: ServiceConfig,
    auth: AuthScheme,
    client: Client,
}

impl HttpService {
    /// Creates a new HTTP service from a validated configuration
    pub fn new(config: ServiceConfig, auth: AuthScheme) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("pictor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config,
            auth,
            client,
        })
    }

    /// Joins a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            AuthScheme::Bearer => request.bearer_auth(&self.config.api_key),
            AuthScheme::Header(name) => request.header(name, &self.config.api_key),
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    pub async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

/// Checks that a caller-supplied image reference is an absolute http(s) URL
pub(crate) fn require_http_url(field: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ClientError::InvalidRequest(format!(
            "{} must be an http(s) URL, got {:?}",
            field, value
        )))
    }
}
