//! Product relighting commands

use anyhow::Result;
use clap::Args;
use colored::*;
use pictor_client::services::lighting::LightingEffect;
use pictor_client::services::replicate::{RelightRequest, ReplicateClient};
use std::process::ExitCode;

use super::{PollArgs, submit_and_wait};
use crate::config::Config;

#[derive(Args)]
pub struct RelightArgs {
    /// URL of the product photo
    #[arg(long)]
    pub subject_image: String,

    /// Lighting effect (see `pictor effects`)
    #[arg(long, default_value = "studio-light")]
    pub effect: LightingEffect,

    /// Custom prompt, replaces the effect's prompt
    #[arg(long)]
    pub prompt: Option<String>,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Relight a product photo and wait for the result
pub async fn handle_relight(args: RelightArgs, config: &Config) -> Result<ExitCode> {
    let client = ReplicateClient::new(config.replicate()?)?;
    let policy = args.poll.apply(ReplicateClient::default_policy(), config);

    let request = match &args.prompt {
        Some(prompt) => RelightRequest::new(&args.subject_image, prompt.as_str()),
        None => RelightRequest::with_effect(&args.subject_image, args.effect),
    };

    let label = match &args.prompt {
        Some(_) => "custom prompt",
        None => args.effect.label(),
    };
    println!("{} {}", "Generating lighting effect:".bold(), label.cyan());

    submit_and_wait(&client, &request, policy, args.poll.verbose).await
}

/// Print every lighting effect with its prompt
pub fn list_effects() {
    println!("{}", "Lighting effects:".bold());
    println!();
    for effect in LightingEffect::ALL {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            effect.slug().bold(),
            format!("({})", effect.label()).dimmed()
        );
        println!("    {}", effect.prompt().dimmed());
    }
}
