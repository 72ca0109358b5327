//! One-shot status command

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use pictor_client::services::segmind::DEFAULT_OUTPUT_FIELD;
use pictor_client::services::{FashnClient, ReplicateClient, SegmindClient};
use pictor_client::{JobHandle, JobStatus, StatusClient};
use pictor_core::machine::DEFAULT_FAILURE_MESSAGE;
use std::process::ExitCode;

use super::process::DEFAULT_WORKFLOW;
use crate::config::Config;
use crate::output::{colorize_status, print_payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Segmind,
    Fashn,
    Replicate,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Service the job was submitted to
    pub service: Service,

    /// Job, request or prediction ID
    pub id: String,

    /// Poll this URL instead of the service's default status endpoint
    #[arg(long)]
    pub poll_url: Option<String>,

    /// Response field holding a Segmind workflow's output image
    #[arg(long, default_value = DEFAULT_OUTPUT_FIELD)]
    pub output_field: String,
}

/// Read and print a job's status once
pub async fn handle_status(args: StatusArgs, config: &Config) -> Result<ExitCode> {
    let handle = match &args.poll_url {
        Some(url) => JobHandle::with_poll_url(&args.id, url)?,
        None => JobHandle::new(&args.id)?,
    };

    match args.service {
        Service::Segmind => {
            let client = SegmindClient::new(config.segmind()?, DEFAULT_WORKFLOW, &args.output_field)?;
            show_status(&client, &handle).await
        }
        Service::Fashn => show_status(&FashnClient::new(config.fashn()?)?, &handle).await,
        Service::Replicate => {
            show_status(&ReplicateClient::new(config.replicate()?)?, &handle).await
        }
    }
}

async fn show_status<C: StatusClient>(client: &C, handle: &JobHandle) -> Result<ExitCode> {
    let payload = client.poll(handle).await?;
    let profile = client.profile();
    let (status, raw) = profile.read_status(&payload);

    println!("{}", "Job Status:".bold());
    println!("  Service: {}", profile.name);
    println!("  ID:      {}", handle.id().cyan());
    println!(
        "  Status:  {} {}",
        colorize_status(status),
        format!("({})", raw.as_deref().unwrap_or("no status")).dimmed()
    );

    match status {
        JobStatus::Completed => match profile.schema.artifact(&payload) {
            Some(url) => println!("  Output:  {}", url.cyan()),
            None => println!("  {}", "Output image URL not found.".red()),
        },
        JobStatus::Failed => {
            let message = profile
                .schema
                .error(&payload)
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            println!("  Error:   {}", message.red());
        }
        _ => {}
    }

    println!("\n{}", "Response:".bold());
    print_payload(&payload);

    Ok(ExitCode::SUCCESS)
}
