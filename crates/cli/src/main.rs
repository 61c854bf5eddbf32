//! JobScout - operator CLI and daemon
//!
//! This is a CLI tool for operators, so `println!` is used for command output
//! rather than structured logging. Logs go to stderr.

#![allow(clippy::print_stdout)]

mod cli;
mod commands;
mod context;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, CredentialsCommand};
use context::AppContext;

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing: clap reads JOBSCOUT_* fallbacks from the environment
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init(cli.log_json);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "Could not load .env file"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Command failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = context::load_config(cli.config)?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::Init => commands::init(&ctx).await,
        Command::Status { json } => commands::status(&ctx, json).await,
        Command::Enable => commands::set_enabled(&ctx, true).await,
        Command::Disable => commands::set_enabled(&ctx, false).await,
        Command::Reset => commands::reset(&ctx).await,
        Command::Tick => commands::tick(&ctx).await,
        Command::Run { cron } => commands::run(&ctx, cron).await,
        Command::Credentials(CredentialsCommand::Import(args)) => {
            commands::import_credentials(&ctx, args).await
        }
    }
}
