//! Progress observers
//!
//! The poller reports every attempt to a [`ProgressObserver`] and never does
//! any presentation itself. Hosts decide what to do with the events: log
//! them, forward them over a channel, or draw a progress bar.

use pictor_core::{AttemptOutcome, PollAttempt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// One poll attempt, as seen by an observer
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Name of the service being polled
    pub service: &'static str,
    pub job_id: String,
    pub attempt: PollAttempt,
    pub max_attempts: u32,
    /// The status payload, absent on transport errors
    pub raw: Option<Value>,
}

impl ProgressEvent {
    /// Fraction of the attempt budget used so far, in `0.0..=1.0`
    pub fn progress(&self) -> f32 {
        if self.max_attempts == 0 {
            return 1.0;
        }
        (self.attempt.attempt as f32 / self.max_attempts as f32).min(1.0)
    }
}

/// Receives a notification for every poll attempt
pub trait ProgressObserver: Send + Sync {
    fn on_attempt(&self, event: &ProgressEvent);
}

/// Ignores all events
impl ProgressObserver for () {
    fn on_attempt(&self, _event: &ProgressEvent) {}
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for Arc<T> {
    fn on_attempt(&self, event: &ProgressEvent) {
        (**self).on_attempt(event)
    }
}

/// Forwards events to a channel
///
/// A dropped receiver is not an error for the poll loop; events are simply
/// no longer delivered.
impl ProgressObserver for UnboundedSender<ProgressEvent> {
    fn on_attempt(&self, event: &ProgressEvent) {
        if self.send(event.clone()).is_err() {
            debug!("Progress receiver dropped, event for job {} not delivered", event.job_id);
        }
    }
}

/// Logs every attempt through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_attempt(&self, event: &ProgressEvent) {
        match &event.attempt.outcome {
            AttemptOutcome::Status { status, raw } => {
                info!(
                    service = event.service,
                    job_id = %event.job_id,
                    attempt = event.attempt.attempt,
                    max_attempts = event.max_attempts,
                    raw_status = raw.as_deref().unwrap_or("<missing>"),
                    "Job status: {}",
                    status
                );
                if let Some(payload) = &event.raw {
                    debug!(job_id = %event.job_id, "Full status payload: {}", payload);
                }
            }
            AttemptOutcome::TransportError { message } => {
                warn!(
                    service = event.service,
                    job_id = %event.job_id,
                    attempt = event.attempt.attempt,
                    max_attempts = event.max_attempts,
                    "Status request failed: {}",
                    message
                );
            }
        }
    }
}
