//! Terminal output
//!
//! Progress lines, results and errors, colored the same way everywhere.

use colored::*;
use pictor_client::{JobResult, JobStatus, PollError, ProgressEvent, ProgressObserver};
use pictor_core::AttemptOutcome;
use serde_json::Value;

/// Prints one line per poll attempt
pub struct ConsoleObserver {
    /// Also print the full status payload of every attempt
    pub verbose: bool,
}

impl ProgressObserver for ConsoleObserver {
    fn on_attempt(&self, event: &ProgressEvent) {
        let counter = format!(
            "[{}/{} {:>3.0}%]",
            event.attempt.attempt,
            event.max_attempts,
            event.progress() * 100.0
        )
        .dimmed();
        let elapsed = format!("{:.0?}", event.attempt.elapsed).dimmed();

        match &event.attempt.outcome {
            AttemptOutcome::Status { status, raw } => {
                let raw = raw.as_deref().unwrap_or("no status");
                println!(
                    "  {} {} {} {}",
                    counter,
                    colorize_status(*status),
                    format!("({})", raw).dimmed(),
                    elapsed
                );
            }
            AttemptOutcome::TransportError { message } => {
                println!(
                    "  {} {} {}",
                    counter,
                    format!("⚠ {}", message).yellow(),
                    elapsed
                );
            }
        }

        if self.verbose {
            if let Some(payload) = &event.raw {
                print_payload(payload);
            }
        }
    }
}

/// Print a finished job
pub fn print_result(result: &JobResult) {
    println!();
    println!("{} {}", "✓".green(), "Job completed".bold());
    println!("  Attempts: {}", result.attempts);
    println!("  Output:   {}", result.artifact_url.cyan());
}

/// Print why a job did not produce an output
pub fn print_error(error: &PollError) {
    println!();
    println!("{} {}", "✗".red(), error.to_string().red());

    match error {
        PollError::Submission(e) if e.is_rate_limited() => {
            println!("{}", "  Rate limit exceeded. Please wait and try again.".yellow());
        }
        PollError::Submission(e) if e.is_client_error() => {
            println!("{}", "  The service refused the request. Check the API key and inputs.".yellow());
        }
        PollError::Exhausted { last: Some(last), .. } => {
            println!("  Last status: {}", last.to_string().dimmed());
        }
        _ => {}
    }

    if let Some(raw) = error.raw() {
        println!("\n{}", "Response:".bold());
        print_payload(raw);
    }
}

/// Pretty-print a JSON payload
pub fn print_payload(payload: &Value) {
    if let Ok(pretty) = serde_json::to_string_pretty(payload) {
        println!("{}", pretty.dimmed());
    } else {
        println!("{:?}", payload);
    }
}

/// Colorize job status for display
pub fn colorize_status(status: JobStatus) -> colored::ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Unknown => status_str.dimmed(),
    }
}
