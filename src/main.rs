//! CLI entry point for the mediarip tool.

use anyhow::{Context, Result};
use clap::Parser;
use mediarip_core::Settings;
use tracing::debug;

mod cli;
mod commands;
mod terminal;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    terminal::init_tracing(terminal::default_level(cli.verbose, cli.quiet));
    debug!(?cli, "CLI arguments parsed");

    let (mut settings, loaded_from) = Settings::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    debug!(config = ?loaded_from, "Settings resolved");

    match &cli.command {
        Command::Fetch(args) => {
            apply_fetch_overrides(&mut settings, args)?;
            commands::run_fetch_command(args, &settings, cli.quiet).await?;
        }
        Command::Filter(args) => {
            let color_mode = args
                .color_mode
                .unwrap_or_else(|| settings.filters.color_mode());
            commands::run_filter_command(args, settings.filters.thresholds(), color_mode).await?;
        }
        Command::Archive(args) => {
            commands::run_archive_command(&args.dir).await?;
        }
        Command::Config => {
            commands::run_config_show_command(&settings, loaded_from.as_deref())?;
        }
    }

    Ok(())
}

/// CLI flags win over file values.
fn apply_fetch_overrides(settings: &mut Settings, args: &cli::FetchArgs) -> Result<()> {
    if let Some(workers) = args.workers {
        settings.fetch.workers = usize::from(workers);
    }
    if let Some(min_bytes) = args.min_bytes {
        settings.fetch.min_bytes = min_bytes;
    }
    if let Some(mode) = args.color_mode {
        settings.filters.color_mode = mode.to_string();
    }
    settings
        .validate()
        .context("Invalid settings after applying command-line flags")?;
    Ok(())
}
