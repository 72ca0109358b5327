//! Poll attempt records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::job::JobStatus;

/// What a single status call produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The service answered; `raw` is its status string, if it sent one
    Status { status: JobStatus, raw: Option<String> },
    /// The call itself failed (network, timeout, non-2xx, unparsable body)
    TransportError { message: String },
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, raw: Some(raw) } => write!(f, "{} ({})", status, raw),
            Self::Status { status, raw: None } => write!(f, "{} (no status field)", status),
            Self::TransportError { message } => write!(f, "transport error: {}", message),
        }
    }
}

/// A single status call made while waiting for a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    /// Time since polling started
    pub elapsed: Duration,
    pub observed_at: chrono::DateTime<chrono::Utc>,
    pub outcome: AttemptOutcome,
}

impl PollAttempt {
    /// Records an attempt observed now
    pub fn new(attempt: u32, elapsed: Duration, outcome: AttemptOutcome) -> Self {
        Self {
            attempt,
            elapsed,
            observed_at: chrono::Utc::now(),
            outcome,
        }
    }

    pub fn status(&self) -> Option<JobStatus> {
        match &self.outcome {
            AttemptOutcome::Status { status, .. } => Some(*status),
            AttemptOutcome::TransportError { .. } => None,
        }
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::TransportError { .. })
    }
}
