//! Poll policy
//!
//! Defines how long and how often the poller waits for a remote job, and how
//! it reacts to statuses and failures it cannot classify.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// What to do when a service reports a status outside its vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownStatusPolicy {
    /// Treat it like "still running" and poll again
    #[default]
    Retry,
    /// Stop and report the unexpected status as a failure
    Fail,
}

/// What to do when a status call fails at the transport level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportErrorPolicy {
    /// Count the attempt and poll again (non-retryable errors still abort)
    #[default]
    Retry,
    /// Stop on the first failed status call
    Abort,
}

/// Reasons a policy can be rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be greater than 0")]
    ZeroAttempts,

    #[error("interval must be greater than 0")]
    ZeroInterval,

    #[error("request_timeout must be greater than 0")]
    ZeroRequestTimeout,

    #[error("deadline must be greater than 0 when set")]
    ZeroDeadline,
}

/// Poll policy
///
/// All budgets are explicit and finite. A poll loop stops after
/// `max_attempts` status calls or once `deadline` has elapsed, whichever
/// comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum number of status calls
    pub max_attempts: u32,

    /// Flat delay between two status calls
    pub interval: Duration,

    /// Optional budget on total elapsed time
    pub deadline: Option<Duration>,

    /// Timeout applied to each individual HTTP call
    pub request_timeout: Duration,

    pub unknown_status: UnknownStatusPolicy,

    pub transport_errors: TransportErrorPolicy,
}

impl PollPolicy {
    /// Creates a policy with the given attempt budget and interval
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_unknown_status(mut self, policy: UnknownStatusPolicy) -> Self {
        self.unknown_status = policy;
        self
    }

    pub fn with_transport_errors(mut self, policy: TransportErrorPolicy) -> Self {
        self.transport_errors = policy;
        self
    }

    /// Upper bound on the time spent sleeping, ignoring request latency
    pub fn max_wait(&self) -> Duration {
        let sleeps = self
            .interval
            .checked_mul(self.max_attempts.saturating_sub(1))
            .unwrap_or(Duration::MAX);
        match self.deadline {
            Some(deadline) => sleeps.min(deadline),
            None => sleeps,
        }
    }

    /// Validates the policy
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }

        if self.interval.is_zero() {
            return Err(PolicyError::ZeroInterval);
        }

        if self.request_timeout.is_zero() {
            return Err(PolicyError::ZeroRequestTimeout);
        }

        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(PolicyError::ZeroDeadline);
        }

        Ok(())
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval: Duration::from_secs(5),
            deadline: None,
            request_timeout: Duration::from_secs(30),
            unknown_status: UnknownStatusPolicy::Retry,
            transport_errors: TransportErrorPolicy::Retry,
        }
    }
}
