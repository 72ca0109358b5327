//! Job poller
//!
//! Submits a job, then polls its status until the service reports a terminal
//! state or the policy's budget runs out. The transition logic lives in
//! [`PollMachine`]; this module only performs the calls, the sleeps and the
//! cancellation checks around it.

use async_trait::async_trait;
use pictor_core::{Observation, PollMachine, PollPolicy, Step};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::PollError;
use crate::observer::{ProgressEvent, ProgressObserver, TracingObserver};
use crate::{JobHandle, JobResult, StatusClient, SubmissionClient};

/// Waits between two status calls
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Drives submit-and-wait cycles for remote jobs
///
/// A poller holds no per-job state; every call to [`wait`](Self::wait) owns
/// its own attempt counter, so one poller can be reused for many jobs.
pub struct JobPoller<S = TokioSleeper, O = TracingObserver> {
    policy: PollPolicy,
    sleeper: S,
    observer: O,
    cancel: CancellationToken,
}

impl JobPoller {
    /// Creates a poller that sleeps on tokio and logs progress through tracing
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            sleeper: TokioSleeper,
            observer: TracingObserver,
            cancel: CancellationToken::new(),
        }
    }
}

impl<S: Sleeper, O: ProgressObserver> JobPoller<S, O> {
    /// Replaces the progress observer
    pub fn with_observer<O2: ProgressObserver>(self, observer: O2) -> JobPoller<S, O2> {
        JobPoller {
            policy: self.policy,
            sleeper: self.sleeper,
            observer,
            cancel: self.cancel,
        }
    }

    /// Replaces the timer used between attempts
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> JobPoller<S2, O> {
        JobPoller {
            policy: self.policy,
            sleeper,
            observer: self.observer,
            cancel: self.cancel,
        }
    }

    /// Uses the given token to stop polling early
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Submits a job and waits for it to finish
    ///
    /// A failed submission is returned as [`PollError::Submission`] and the
    /// status endpoint is never called.
    pub async fn run<C>(&self, client: &C, job: &C::Job) -> Result<JobResult, PollError>
    where
        C: SubmissionClient + StatusClient,
    {
        self.policy.validate()?;

        let service = client.profile().name;
        let handle = match client.submit(job).await {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to submit job to {}: {}", service, e);
                return Err(PollError::Submission(e));
            }
        };

        info!("Submitted job {} to {}", handle, service);

        self.wait(client, &handle).await
    }

    /// Polls an already submitted job until it finishes
    ///
    /// The handle and policy are validated before any network call.
    pub async fn wait<C>(&self, client: &C, handle: &JobHandle) -> Result<JobResult, PollError>
    where
        C: StatusClient + ?Sized,
    {
        handle.validate()?;
        self.policy.validate()?;

        let profile = client.profile();
        let started = Instant::now();
        let mut machine = PollMachine::new(profile, &self.policy);

        info!(
            "Polling {} job {} (max {} attempts, interval {:?})",
            profile.name, handle, self.policy.max_attempts, self.policy.interval
        );

        loop {
            if self.cancel.is_cancelled() {
                return Err(self.cancelled(handle, machine.attempts()));
            }

            let observation = self.poll_once(client, handle).await;
            let (attempt, step) = machine.observe(&observation, started.elapsed());

            self.observer.on_attempt(&ProgressEvent {
                service: profile.name,
                job_id: handle.id().to_string(),
                attempt,
                max_attempts: self.policy.max_attempts,
                raw: match observation {
                    Observation::Payload(payload) => Some(payload),
                    Observation::TransportError { .. } => None,
                },
            });

            match step {
                Step::Retry {
                    machine: next,
                    after,
                } => {
                    machine = next;
                    debug!("Job {} not finished, retrying in {:?}", handle, after);

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            return Err(self.cancelled(handle, machine.attempts()));
                        }
                        _ = self.sleeper.sleep(after) => {}
                    }
                }
                Step::Finished(termination) => {
                    let result = PollError::from_termination(termination);
                    match &result {
                        Ok(job) => info!(
                            "Job {} completed after {} attempt(s): {}",
                            handle, job.attempts, job.artifact_url
                        ),
                        Err(e) => error!("Job {} did not complete: {}", handle, e),
                    }
                    return result;
                }
            }
        }
    }

    /// Makes one status call, bounded by the policy's request timeout
    async fn poll_once<C>(&self, client: &C, handle: &JobHandle) -> Observation
    where
        C: StatusClient + ?Sized,
    {
        match tokio::time::timeout(self.policy.request_timeout, client.poll(handle)).await {
            Ok(Ok(payload)) => Observation::Payload(payload),
            Ok(Err(e)) => {
                warn!("Status request for job {} failed: {}", handle, e);
                Observation::TransportError {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                }
            }
            Err(_) => {
                warn!(
                    "Status request for job {} timed out after {:?}",
                    handle, self.policy.request_timeout
                );
                Observation::TransportError {
                    message: format!(
                        "status request timed out after {:?}",
                        self.policy.request_timeout
                    ),
                    retryable: true,
                }
            }
        }
    }

    fn cancelled(&self, handle: &JobHandle, attempts: u32) -> PollError {
        warn!("Polling for job {} cancelled after {} attempt(s)", handle, attempts);
        PollError::Cancelled { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, Result};
    use pictor_core::{
        AttemptOutcome, JobStatus, PayloadSchema, ServiceProfile, StatusVocabulary,
        UnknownStatusPolicy,
    };
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted service: returns queued responses in order, repeating the last one
    struct FakeService {
        profile: ServiceProfile,
        submission: Mutex<Option<Result<JobHandle>>>,
        responses: Mutex<VecDeque<Result<Value>>>,
        last: Mutex<Option<Value>>,
        polls: AtomicU32,
    }

    impl FakeService {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                profile: ServiceProfile::new(
                    "fake",
                    StatusVocabulary::FASHN,
                    PayloadSchema::output_list(),
                ),
                submission: Mutex::new(Some(Ok(JobHandle::new("job-1").unwrap()))),
                responses: Mutex::new(responses.into()),
                last: Mutex::new(None),
                polls: AtomicU32::new(0),
            }
        }

        fn always(payload: Value) -> Self {
            Self::new(vec![Ok(payload)])
        }

        fn failing_submission(self, err: ClientError) -> Self {
            *self.submission.lock().unwrap() = Some(Err(err));
            self
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubmissionClient for FakeService {
        type Job = ();

        async fn submit(&self, _job: &()) -> Result<JobHandle> {
            self.submission
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(JobHandle::new("job-1").unwrap()))
        }
    }

    #[async_trait]
    impl StatusClient for FakeService {
        fn profile(&self) -> &ServiceProfile {
            &self.profile
        }

        async fn poll(&self, _handle: &JobHandle) -> Result<Value> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(Ok(payload)) => {
                    *self.last.lock().unwrap() = Some(payload.clone());
                    Ok(payload)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| json!({}))),
            }
        }
    }

    /// Records requested sleeps without waiting
    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn poller(
        max_attempts: u32,
    ) -> (
        JobPoller<Arc<RecordingSleeper>, ()>,
        Arc<RecordingSleeper>,
    ) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let poller = JobPoller::new(PollPolicy::new(max_attempts, Duration::from_secs(5)))
            .with_sleeper(sleeper.clone())
            .with_observer(());
        (poller, sleeper)
    }

    fn completed() -> Value {
        json!({"status": "completed", "output": ["https://cdn.example.com/out.png"], "error": null})
    }

    #[tokio::test]
    async fn test_immediate_completion() {
        let service = FakeService::always(completed());
        let (poller, sleeper) = poller(12);

        let result = poller.run(&service, &()).await.unwrap();

        assert_eq!(result.artifact_url, "https://cdn.example.com/out.png");
        assert_eq!(result.attempts, 1);
        assert_eq!(service.polls(), 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_always_running_exhausts_budget() {
        let service = FakeService::always(json!({"status": "processing", "progress": 42}));
        let (poller, sleeper) = poller(4);

        let err = poller.run(&service, &()).await.unwrap_err();

        assert_eq!(
            err.raw(),
            Some(&json!({"status": "processing", "progress": 42}))
        );
        match err {
            PollError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 4);
                assert!(matches!(
                    last,
                    Some(AttemptOutcome::Status {
                        status: JobStatus::Running,
                        ..
                    })
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.polls(), 4);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(5); 3]
        );
    }

    #[tokio::test]
    async fn test_completed_without_output() {
        let service = FakeService::always(json!({"status": "completed", "output": []}));
        let (poller, _) = poller(12);

        let err = poller.run(&service, &()).await.unwrap_err();

        assert!(matches!(err, PollError::MissingArtifact { .. }));
        assert!(err.raw().is_some());
    }

    #[tokio::test]
    async fn test_remote_failure() {
        let service = FakeService::always(json!({"status": "failed", "error": "bad input"}));
        let (poller, _) = poller(12);

        let err = poller.run(&service, &()).await.unwrap_err();

        match err {
            PollError::RemoteFailure { message, .. } => assert_eq!(message, "bad input"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.polls(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_never_polls() {
        let service = FakeService::always(completed())
            .failing_submission(ClientError::api_error(429, "rate limited"));
        let (poller, _) = poller(12);

        let err = poller.run(&service, &()).await.unwrap_err();

        match err {
            PollError::Submission(e) => assert!(e.is_rate_limited()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.polls(), 0);
    }

    #[tokio::test]
    async fn test_waiting_twice_is_idempotent() {
        let service = FakeService::always(completed());
        let (poller, _) = poller(12);
        let handle = JobHandle::new("job-1").unwrap();

        let first = poller.wait(&service, &handle).await.unwrap();
        let second = poller.wait(&service, &handle).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(handle.id(), "job-1");
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let service = FakeService::new(vec![
            Err(ClientError::api_error(503, "unavailable")),
            Ok(json!({"status": "in_queue"})),
            Err(ClientError::ParseError("truncated body".to_string())),
            Ok(completed()),
        ]);
        let (poller, sleeper) = poller(12);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let poller = poller.with_observer(tx);

        let result = poller.run(&service, &()).await.unwrap();

        assert_eq!(result.attempts, 4);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 3);

        let mut transport_errors = 0;
        let mut events = 0;
        while let Ok(event) = rx.try_recv() {
            events += 1;
            if event.attempt.is_transport_error() {
                transport_errors += 1;
                assert!(event.raw.is_none());
            }
        }
        assert_eq!(events, 4);
        assert_eq!(transport_errors, 2);
    }

    #[tokio::test]
    async fn test_non_retryable_transport_error_aborts() {
        let service = FakeService::new(vec![Err(ClientError::api_error(401, "unauthorized"))]);
        let (poller, _) = poller(12);

        let err = poller
            .wait(&service, &JobHandle::new("job-1").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, PollError::TransportFailure { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_unexpected_status_with_fail_policy() {
        let service = FakeService::always(json!({"status": "paused"}));
        let sleeper = Arc::new(RecordingSleeper::default());
        let poller = JobPoller::new(
            PollPolicy::new(12, Duration::from_secs(5))
                .with_unknown_status(UnknownStatusPolicy::Fail),
        )
        .with_sleeper(sleeper)
        .with_observer(());

        let err = poller.run(&service, &()).await.unwrap_err();

        match err {
            PollError::UnexpectedStatus { status, .. } => assert_eq!(status, "paused"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(service.polls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_is_retried_by_default() {
        let service = FakeService::new(vec![Ok(json!({"status": "paused"})), Ok(completed())]);
        let (poller, _) = poller(12);

        let result = poller.run(&service, &()).await.unwrap();

        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_poll() {
        let service = FakeService::always(completed());
        let token = CancellationToken::new();
        token.cancel();
        let (poller, _) = poller(12);
        let poller = poller.with_cancellation(token);

        let err = poller.run(&service, &()).await.unwrap_err();

        assert!(matches!(err, PollError::Cancelled { attempts: 0 }));
        assert_eq!(service.polls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_while_sleeping() {
        let service = FakeService::always(json!({"status": "processing"}));
        let token = CancellationToken::new();
        let poller = JobPoller::new(PollPolicy::new(12, Duration::from_secs(3600)))
            .with_observer(())
            .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = poller.run(&service, &()).await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, PollError::Cancelled { attempts: 1 }));
        assert_eq!(service.polls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_handle_rejected_before_polling() {
        let service = FakeService::always(completed());
        let (poller, _) = poller(12);
        let handle: JobHandle = serde_json::from_value(json!({"id": " ", "poll_url": null})).unwrap();

        let err = poller.wait(&service, &handle).await.unwrap_err();

        assert!(matches!(err, PollError::InvalidHandle(_)));
        assert_eq!(service.polls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_policy_rejected_before_submission() {
        let service = FakeService::always(completed());
        let (poller, _) = poller(0);

        let err = poller.run(&service, &()).await.unwrap_err();

        assert!(matches!(err, PollError::InvalidPolicy(_)));
        assert_eq!(service.polls(), 0);
    }
}
