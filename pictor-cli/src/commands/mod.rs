//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod process;
mod relight;
mod status;
mod tryon;

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use pictor_client::{
    CancellationToken, JobPoller, PollPolicy, StatusClient, SubmissionClient,
};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::output::{ConsoleObserver, print_error, print_result};

pub use process::ProcessArgs;
pub use relight::RelightArgs;
pub use status::StatusArgs;
pub use tryon::TryOnArgs;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a Segmind image workflow
    Process(ProcessArgs),
    /// Dress a model image in a garment (FASHN)
    TryOn(TryOnArgs),
    /// Relight a product photo (Replicate IC-Light)
    Relight(RelightArgs),
    /// Read the current status of a submitted job once
    Status(StatusArgs),
    /// List the available lighting effects
    Effects,
}

/// Polling options shared by the job commands
#[derive(Args, Debug, Clone, Default)]
pub struct PollArgs {
    /// Maximum number of status checks (service default if omitted)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds between status checks
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Give up after this many seconds in total
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Print the full status payload of every check
    #[arg(short, long)]
    pub verbose: bool,
}

impl PollArgs {
    /// Applies the overrides on top of a service's default policy
    pub fn apply(&self, mut policy: PollPolicy, config: &Config) -> PollPolicy {
        if let Some(max_attempts) = self.max_attempts {
            policy.max_attempts = max_attempts;
        }
        if let Some(secs) = self.interval_secs {
            policy.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.deadline_secs {
            policy = policy.with_deadline(Duration::from_secs(secs));
        }
        policy.with_request_timeout(config.request_timeout)
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Process(args) => process::handle_process(args, config).await,
        Commands::TryOn(args) => tryon::handle_try_on(args, config).await,
        Commands::Relight(args) => relight::handle_relight(args, config).await,
        Commands::Status(args) => status::handle_status(args, config).await,
        Commands::Effects => {
            relight::list_effects();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Submits a job, prints progress until it finishes, then prints the outcome
///
/// A job that does not produce an output is reported here and turned into a
/// failing exit code. Ctrl-C stops the wait; the remote job itself keeps
/// running.
pub(crate) async fn submit_and_wait<C>(
    client: &C,
    job: &C::Job,
    policy: PollPolicy,
    verbose: bool,
) -> Result<ExitCode>
where
    C: SubmissionClient + StatusClient,
{
    let token = CancellationToken::new();
    let ctrl_c = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, stopping");
                token.cancel();
            }
        })
    };

    println!(
        "{}",
        format!(
            "Checking up to {} times, waiting at most {:?}",
            policy.max_attempts,
            policy.max_wait()
        )
        .dimmed()
    );

    let poller = JobPoller::new(policy)
        .with_observer(ConsoleObserver { verbose })
        .with_cancellation(token);

    let result = poller.run(client, job).await;
    ctrl_c.abort();

    match result {
        Ok(result) => {
            print_result(&result);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pictor_client::{ClientError, JobHandle, ServiceProfile};
    use pictor_core::{PayloadSchema, StatusVocabulary};
    use serde_json::Value;

    struct RejectingService {
        profile: ServiceProfile,
    }

    #[async_trait]
    impl SubmissionClient for RejectingService {
        type Job = ();

        async fn submit(&self, _job: &()) -> pictor_client::Result<JobHandle> {
            Err(ClientError::api_error(401, "invalid api key"))
        }
    }

    #[async_trait]
    impl StatusClient for RejectingService {
        fn profile(&self) -> &ServiceProfile {
            &self.profile
        }

        async fn poll(&self, _handle: &JobHandle) -> pictor_client::Result<Value> {
            panic!("a rejected submission must not be polled");
        }
    }

    fn config() -> Config {
        Config {
            segmind_api_key: None,
            segmind_url: "https://api.segmind.com".to_string(),
            fashn_api_key: None,
            fashn_url: "https://api.fashn.ai".to_string(),
            replicate_api_token: None,
            replicate_url: "https://api.replicate.com".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    #[test]
    fn test_poll_args_override_policy() {
        let args = PollArgs {
            max_attempts: Some(3),
            interval_secs: Some(1),
            deadline_secs: Some(10),
            verbose: false,
        };
        let policy = args.apply(PollPolicy::default(), &config());

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.deadline, Some(Duration::from_secs(10)));
        assert_eq!(policy.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_poll_args_keep_defaults() {
        let defaults = PollPolicy::new(60, Duration::from_secs(5));
        let policy = PollArgs::default().apply(defaults.clone(), &config());

        assert_eq!(policy.max_attempts, defaults.max_attempts);
        assert_eq!(policy.interval, defaults.interval);
        assert_eq!(policy.deadline, None);
    }

    #[tokio::test]
    async fn test_failed_job_is_an_exit_code_not_an_error() {
        let service = RejectingService {
            profile: ServiceProfile::new(
                "test",
                StatusVocabulary::FASHN,
                PayloadSchema::output_list(),
            ),
        };

        let code = submit_and_wait(
            &service,
            &(),
            PollPolicy::new(1, Duration::from_secs(1)),
            false,
        )
        .await
        .unwrap();

        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}
