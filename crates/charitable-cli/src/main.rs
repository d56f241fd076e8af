mod actions;
mod browser;
mod commands;

use std::sync::Arc;

use clap::Parser;

use charitable_api::{ClientConfig, HttpApi};
use charitable_identity::{GuestIdentity, SqliteStore};

use crate::actions::Context;
use crate::commands::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Init logging
    let default_filter = if cli.verbose {
        "charitable=debug"
    } else {
        "charitable=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Config
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }

    let api = HttpApi::from_config(&config)?;
    let identity = Arc::new(GuestIdentity::new(SqliteStore::open(&cli.state)?));
    let ctx = Context {
        api,
        identity,
        timeout: config.timeout,
    };

    match cli.command {
        Command::Feed { limit, pages } => actions::feed(&ctx, limit, pages).await,
        Command::Nonprofits => actions::nonprofits(&ctx).await,
        Command::Nonprofit { slug } => actions::nonprofit(&ctx, &slug).await,
        Command::Posts { nonprofit_id } => actions::posts(&ctx, nonprofit_id.into()).await,
        Command::Like { post_id } => actions::like(&ctx, post_id.into()).await,
        Command::Donate {
            nonprofit_id,
            cents,
            post,
            name,
            email,
            message,
            anonymous,
        } => {
            let donor = charitable_types::api::DonorDetails {
                donor_name: name,
                donor_email: email,
                message,
                is_anonymous: anonymous.then_some(true),
            };
            actions::donate(&ctx, nonprofit_id.into(), cents, post.map(Into::into), donor).await
        }
        Command::Verify { session_id } => actions::verify(&ctx, session_id.into()).await,
        Command::Whoami => actions::whoami(&ctx, &cli.state).await,
    }
}
