//! Segmind workflow command

use anyhow::Result;
use clap::Args;
use colored::*;
use pictor_client::services::segmind::{DEFAULT_OUTPUT_FIELD, SegmindClient, WorkflowJob};
use std::process::ExitCode;

use super::{PollArgs, submit_and_wait};
use crate::config::Config;

/// Workflow used when none is given
pub const DEFAULT_WORKFLOW: &str = "674e866b0cbb977e665e86ec-v5";

#[derive(Args)]
pub struct ProcessArgs {
    /// URL of the image to process
    #[arg(long)]
    pub image_url: String,

    /// Workflow to run
    #[arg(long, env = "SEGMIND_WORKFLOW_ID", default_value = DEFAULT_WORKFLOW)]
    pub workflow: String,

    /// Response field holding the workflow's output image
    #[arg(long, default_value = DEFAULT_OUTPUT_FIELD)]
    pub output_field: String,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Run an image through a Segmind workflow
pub async fn handle_process(args: ProcessArgs, config: &Config) -> Result<ExitCode> {
    let client = SegmindClient::new(config.segmind()?, &args.workflow, &args.output_field)?;
    let policy = args.poll.apply(SegmindClient::default_policy(), config);

    println!(
        "{} {}",
        "Processing image with workflow".bold(),
        args.workflow.cyan()
    );

    submit_and_wait(
        &client,
        &WorkflowJob::image(args.image_url),
        policy,
        args.poll.verbose,
    )
    .await
}
