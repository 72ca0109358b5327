//! Poll state machine
//!
//! The transition logic of a poll loop, with no I/O and no clock of its own.
//! A driver makes the status call, feeds what came back into
//! [`PollMachine::observe`], and either sleeps and calls again or stops.
//!
//! ```text
//! Polling --observe--> Polling (Retry after interval)
//!                  \-> Completed | RemoteFailure | MissingArtifact
//!                      | UnexpectedStatus | TransportFailure | Exhausted
//! ```
//!
//! `observe` consumes the machine and only hands it back on `Retry`, so a
//! loop cannot keep polling after it has terminated.

use serde_json::Value;
use std::time::Duration;

use crate::domain::attempt::{AttemptOutcome, PollAttempt};
use crate::domain::job::{JobResult, JobStatus};
use crate::domain::policy::{PollPolicy, TransportErrorPolicy, UnknownStatusPolicy};
use crate::vocabulary::ServiceProfile;

/// Error message used when a failed job carries none
pub const DEFAULT_FAILURE_MESSAGE: &str = "Unknown error";

/// What a driver got back from one status call
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The service answered with a status payload
    Payload(Value),
    /// The call failed before a payload could be read
    TransportError { message: String, retryable: bool },
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    Completed(JobResult),
    /// The service reported the job as failed
    RemoteFailure { message: String, raw: Value },
    /// The service reported completion but the payload has no artifact
    MissingArtifact { raw: Value },
    /// An unrecognized status under [`UnknownStatusPolicy::Fail`]
    UnexpectedStatus { status: Option<String>, raw: Value },
    /// A status call failed and the policy does not allow retrying it
    TransportFailure { attempts: u32, message: String },
    /// The attempt or time budget ran out before a terminal status
    Exhausted {
        attempts: u32,
        last: Option<AttemptOutcome>,
        /// The most recent status payload, even if later calls failed
        last_payload: Option<Value>,
    },
}

/// Next move for the driver
#[derive(Debug)]
pub enum Step<'a> {
    /// Sleep for `after`, then make another status call
    Retry {
        machine: PollMachine<'a>,
        after: Duration,
    },
    Finished(Termination),
}

/// Poll loop state for a single job
#[derive(Debug, Clone)]
pub struct PollMachine<'a> {
    profile: &'a ServiceProfile,
    policy: &'a PollPolicy,
    attempts: u32,
    last_payload: Option<Value>,
}

impl<'a> PollMachine<'a> {
    pub fn new(profile: &'a ServiceProfile, policy: &'a PollPolicy) -> Self {
        Self {
            profile,
            policy,
            attempts: 0,
            last_payload: None,
        }
    }

    /// Number of status calls observed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Feeds the result of one status call into the machine
    ///
    /// `elapsed` is the time since polling started, as measured by the driver.
    /// Returns the attempt record (for observers) and the next step.
    pub fn observe(
        mut self,
        observation: &Observation,
        elapsed: Duration,
    ) -> (PollAttempt, Step<'a>) {
        self.attempts += 1;
        let number = self.attempts;

        let (outcome, step) = match observation {
            Observation::Payload(payload) => {
                self.last_payload = Some(payload.clone());
                let (status, raw) = self.profile.read_status(payload);
                let outcome = AttemptOutcome::Status {
                    status,
                    raw: raw.clone(),
                };
                let step = self.after_status(status, raw, payload, outcome.clone(), elapsed);
                (outcome, step)
            }
            Observation::TransportError { message, retryable } => {
                let outcome = AttemptOutcome::TransportError {
                    message: message.clone(),
                };
                let step = if !retryable
                    || self.policy.transport_errors == TransportErrorPolicy::Abort
                {
                    Step::Finished(Termination::TransportFailure {
                        attempts: number,
                        message: message.clone(),
                    })
                } else {
                    self.retry_or_exhaust(outcome.clone(), elapsed)
                };
                (outcome, step)
            }
        };

        let attempt = PollAttempt::new(number, elapsed, outcome);

        (attempt, step)
    }

    fn after_status(
        self,
        status: JobStatus,
        raw_status: Option<String>,
        payload: &Value,
        outcome: AttemptOutcome,
        elapsed: Duration,
    ) -> Step<'a> {
        let schema = &self.profile.schema;

        match status {
            JobStatus::Completed => match schema.artifact(payload) {
                Some(artifact_url) => Step::Finished(Termination::Completed(JobResult {
                    artifact_url,
                    raw: payload.clone(),
                    attempts: self.attempts,
                })),
                None => Step::Finished(Termination::MissingArtifact {
                    raw: payload.clone(),
                }),
            },
            JobStatus::Failed => Step::Finished(Termination::RemoteFailure {
                message: schema
                    .error(payload)
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                raw: payload.clone(),
            }),
            JobStatus::Unknown if self.policy.unknown_status == UnknownStatusPolicy::Fail => {
                Step::Finished(Termination::UnexpectedStatus {
                    status: raw_status,
                    raw: payload.clone(),
                })
            }
            JobStatus::Pending | JobStatus::Running | JobStatus::Unknown => {
                self.retry_or_exhaust(outcome, elapsed)
            }
        }
    }

    fn retry_or_exhaust(self, last: AttemptOutcome, elapsed: Duration) -> Step<'a> {
        let after = match self.policy.deadline {
            _ if self.attempts >= self.policy.max_attempts => None,
            Some(deadline) if elapsed >= deadline => None,
            Some(deadline) => Some(self.policy.interval.min(deadline - elapsed)),
            None => Some(self.policy.interval),
        };

        match after {
            Some(after) => Step::Retry {
                machine: self,
                after,
            },
            None => Step::Finished(Termination::Exhausted {
                attempts: self.attempts,
                last: Some(last),
                last_payload: self.last_payload,
            }),
        }
    }
}
