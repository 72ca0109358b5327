//! Pictor CLI
//!
//! Command-line interface for running image jobs on remote services and
//! waiting for their results.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pictor")]
#[command(about = "Run image jobs on remote AI services", long_about = None)]
struct Cli {
    /// Segmind API key
    #[arg(long, env = "SEGMIND_API_KEY", hide_env_values = true)]
    segmind_api_key: Option<String>,

    /// Segmind API base URL
    #[arg(long, env = "SEGMIND_URL", default_value = "https://api.segmind.com")]
    segmind_url: String,

    /// FASHN API key
    #[arg(long, env = "FASHN_API_KEY", hide_env_values = true)]
    fashn_api_key: Option<String>,

    /// FASHN API base URL
    #[arg(long, env = "FASHN_URL", default_value = "https://api.fashn.ai")]
    fashn_url: String,

    /// Replicate API token
    #[arg(long, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    replicate_api_token: Option<String>,

    /// Replicate API base URL
    #[arg(long, env = "REPLICATE_URL", default_value = "https://api.replicate.com")]
    replicate_url: String,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "PICTOR_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pictor_cli=info,pictor_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        segmind_api_key: cli.segmind_api_key,
        segmind_url: cli.segmind_url,
        fashn_api_key: cli.fashn_api_key,
        fashn_url: cli.fashn_url,
        replicate_api_token: cli.replicate_api_token,
        replicate_url: cli.replicate_url,
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
    };

    handle_command(cli.command, &config).await
}
