//! Virtual try-on command

use anyhow::Result;
use clap::Args;
use colored::*;
use pictor_client::services::fashn::{FashnClient, GarmentCategory, TryOnRequest};
use std::process::ExitCode;

use super::{PollArgs, submit_and_wait};
use crate::config::Config;

#[derive(Args)]
pub struct TryOnArgs {
    /// URL of the model (person) image
    #[arg(long)]
    pub model_image: String,

    /// URL of the garment image
    #[arg(long)]
    pub garment_image: String,

    /// Garment category: tops, bottoms or one-pieces
    #[arg(long)]
    pub category: GarmentCategory,

    /// The garment photo is a flat-lay shot
    #[arg(long)]
    pub flat_lay: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

/// Request a try-on and wait for the result
pub async fn handle_try_on(args: TryOnArgs, config: &Config) -> Result<ExitCode> {
    let client = FashnClient::new(config.fashn()?)?;
    let policy = args.poll.apply(FashnClient::default_policy(), config);

    let request = TryOnRequest {
        model_image: args.model_image,
        garment_image: args.garment_image,
        category: args.category,
        flat_lay: args.flat_lay,
    };

    println!(
        "{} {}{}",
        "Requesting try-on:".bold(),
        request.category.to_string().cyan(),
        if request.flat_lay { " (flat lay)" } else { "" }
    );

    submit_and_wait(&client, &request, policy, args.poll.verbose).await
}
