//! Error types for the Pictor client

use pictor_core::{AttemptOutcome, HandleError, JobResult, PolicyError, Termination};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a remote service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The service accepted the HTTP request but refused the job
    #[error("Request rejected by service: {0}")]
    Rejected(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if the service asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::ApiError { status: 429, .. })
    }

    /// Whether repeating the same request could succeed
    ///
    /// Transport failures, 5xx, 408, 429 and unparsable bodies are worth
    /// another try. Other 4xx responses (bad key, unknown job) and local
    /// validation errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(e) => !e.is_builder(),
            Self::ApiError { status, .. } => {
                self.is_server_error() || self.is_rate_limited() || *status == 408
            }
            Self::ParseError(_) => true,
            Self::Rejected(_) | Self::InvalidRequest(_) | Self::InvalidConfig(_) => false,
        }
    }
}

impl From<HandleError> for ClientError {
    fn from(err: HandleError) -> Self {
        Self::ParseError(format!("service returned an unusable job handle: {}", err))
    }
}

/// Errors that end a submit-and-wait cycle
#[derive(Debug, Error)]
pub enum PollError {
    #[error("invalid job handle: {0}")]
    InvalidHandle(#[from] HandleError),

    #[error("invalid poll policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    /// The initial request failed; no polling happened
    #[error("job submission failed: {0}")]
    Submission(#[from] ClientError),

    #[error("job failed: {message}")]
    RemoteFailure { message: String, raw: Value },

    #[error("job completed but the response contains no output")]
    MissingArtifact { raw: Value },

    #[error("unexpected job status: {status}")]
    UnexpectedStatus { status: String, raw: Value },

    #[error("status request failed after {attempts} attempt(s): {message}")]
    TransportFailure { attempts: u32, message: String },

    #[error("job did not finish within {attempts} attempt(s)")]
    Exhausted {
        attempts: u32,
        last: Option<AttemptOutcome>,
        last_payload: Option<Value>,
    },

    #[error("polling cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

impl PollError {
    /// The last status payload, when the error carries one
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Self::RemoteFailure { raw, .. }
            | Self::MissingArtifact { raw }
            | Self::UnexpectedStatus { raw, .. } => Some(raw),
            Self::Exhausted { last_payload, .. } => last_payload.as_ref(),
            _ => None,
        }
    }

    /// Converts how a poll loop ended into the caller-facing result
    pub fn from_termination(termination: Termination) -> std::result::Result<JobResult, Self> {
        match termination {
            Termination::Completed(result) => Ok(result),
            Termination::RemoteFailure { message, raw } => Err(Self::RemoteFailure { message, raw }),
            Termination::MissingArtifact { raw } => Err(Self::MissingArtifact { raw }),
            Termination::UnexpectedStatus { status, raw } => Err(Self::UnexpectedStatus {
                status: status.unwrap_or_else(|| "<missing>".to_string()),
                raw,
            }),
            Termination::TransportFailure { attempts, message } => {
                Err(Self::TransportFailure { attempts, message })
            }
            Termination::Exhausted {
                attempts,
                last,
                last_payload,
            } => Err(Self::Exhausted {
                attempts,
                last,
                last_payload,
            }),
        }
    }
}
