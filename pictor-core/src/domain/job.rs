//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a job handle can be rejected at construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("job id cannot be empty")]
    EmptyId,

    #[error("poll url must start with http:// or https://, got {0:?}")]
    InvalidPollUrl(String),
}

/// Identifier of a job accepted by a remote service
///
/// Returned by the submission step. Some services hand back a direct URL to
/// poll, others only an id that the status client turns into a URL itself.
/// Fields are private so a handle cannot change once it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    id: String,
    poll_url: Option<String>,
}

impl JobHandle {
    /// Creates a handle from a bare job id
    pub fn new(id: impl Into<String>) -> Result<Self, HandleError> {
        let id = id.into();
        Self::validate_id(&id)?;
        Ok(Self { id, poll_url: None })
    }

    /// Creates a handle that carries the endpoint to poll
    pub fn with_poll_url(
        id: impl Into<String>,
        poll_url: impl Into<String>,
    ) -> Result<Self, HandleError> {
        let id = id.into();
        let poll_url = poll_url.into();
        Self::validate_id(&id)?;
        Self::validate_url(&poll_url)?;
        Ok(Self {
            id,
            poll_url: Some(poll_url),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn poll_url(&self) -> Option<&str> {
        self.poll_url.as_deref()
    }

    /// Re-checks the handle invariants
    ///
    /// Handles built through the constructors always pass. Handles that came
    /// in through deserialization skip the constructors, so the poller checks
    /// again before making any network call.
    pub fn validate(&self) -> Result<(), HandleError> {
        Self::validate_id(&self.id)?;
        if let Some(url) = &self.poll_url {
            Self::validate_url(url)?;
        }
        Ok(())
    }

    fn validate_id(id: &str) -> Result<(), HandleError> {
        if id.trim().is_empty() {
            return Err(HandleError::EmptyId);
        }
        Ok(())
    }

    fn validate_url(url: &str) -> Result<(), HandleError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(HandleError::InvalidPollUrl(url.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Normalized job status
///
/// Every service speaks its own status vocabulary; a
/// [`StatusVocabulary`](crate::vocabulary::StatusVocabulary) maps those raw
/// strings onto this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// A raw value outside the service's known vocabulary, or no status at all
    Unknown,
}

impl JobStatus {
    /// Whether polling stops once this status is observed
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Outcome of a job that completed successfully
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Reference to the produced artifact (an image URL)
    pub artifact_url: String,
    /// The status payload the artifact was read from
    pub raw: serde_json::Value,
    /// Number of status calls it took to observe completion
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_rejects_blank_id() {
        assert_eq!(JobHandle::new(""), Err(HandleError::EmptyId));
        assert_eq!(JobHandle::new("   "), Err(HandleError::EmptyId));
    }

    #[test]
    fn test_handle_with_poll_url() {
        let handle =
            JobHandle::with_poll_url("req-1", "https://api.example.com/requests/req-1").unwrap();
        assert_eq!(handle.id(), "req-1");
        assert_eq!(
            handle.poll_url(),
            Some("https://api.example.com/requests/req-1")
        );
        assert!(handle.validate().is_ok());
    }

    #[test]
    fn test_handle_rejects_non_http_poll_url() {
        let err = JobHandle::with_poll_url("req-1", "ftp://example.com").unwrap_err();
        assert!(matches!(err, HandleError::InvalidPollUrl(_)));
    }

    #[test]
    fn test_deserialized_handle_is_revalidated() {
        let handle: JobHandle =
            serde_json::from_str(r#"{"id": "", "poll_url": null}"#).unwrap();
        assert_eq!(handle.validate(), Err(HandleError::EmptyId));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }
}
