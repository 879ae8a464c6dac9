#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod core;
mod prelude;
mod quantity;

use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let env_file_error = load_env_file().err();
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .compact()
        .init();
    info!(version = crate_version!(), "starting…");
    if let Some(error) = env_file_error {
        warn!("failed to load the environment file: {error:#}");
    }

    match Args::parse().command {
        Command::Guard(args) => (*args).run().await?,
        Command::Burrow(args) => (*args).run().await?,
    }

    info!("done!");
    Ok(())
}

/// Load `ENV_FILE` if set, otherwise `.env` if it exists. Already set variables take precedence.
fn load_env_file() -> Result {
    match std::env::var_os("ENV_FILE") {
        Some(path) => {
            dotenvy::from_path(&path)
                .with_context(|| format!("failed to load `{}`", path.to_string_lossy()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(_) => {}
            Err(error) if error.not_found() => {}
            Err(error) => return Err(Error::from(error).context("failed to load `.env`")),
        },
    }
    Ok(())
}
