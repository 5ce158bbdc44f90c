//! Vaultdex CLI
//!
//! Local full-text search for markdown and PDF vaults.

use anyhow::Result;
use clap::Parser;
use vaultdex_core::error::exit_codes;
use vaultdex_core::{Config, Engine, VaultdexError};

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<VaultdexError>()
            .map(VaultdexError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // VAULTDEX_VAULT and VAULTDEX_DB override the configured locations
    let engine = Engine::open(config)?;

    let engine = match cli.command {
        Commands::Index(args) => commands::index::run(args, engine, cli.format).await?,
        Commands::Search(args) => {
            commands::search::run(args, &engine, cli.format)?;
            engine
        }
        Commands::Highlight(args) => {
            commands::highlight::run(args, &engine, cli.format)?;
            engine
        }
        Commands::Tags => {
            commands::status::run_tags(&engine, cli.format)?;
            engine
        }
        Commands::Status => {
            commands::status::run(&engine, cli.format)?;
            engine
        }
        Commands::Pending(args) => commands::pending::run(args, engine, cli.format).await?,
    };

    engine.shutdown()?;
    Ok(())
}
