use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nt_core::TrackerApi;
use tracing_subscriber::EnvFilter;

use nt_cli::commands::{self, export, show, start_stop, update, watch};
use nt_cli::{Cli, Commands, Config, ConfigAction, FsHost};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let active = cli.file.clone().or_else(|| config.active_document.clone());
    let host = FsHost::new(active);
    let api = TrackerApi::local(config.tracker.clone());

    match cli.command {
        Commands::Show { json } => show::run(&host, &api, json).await?,
        Commands::Update => update::run(&host, &api).await?,
        Commands::Start { name, tracker } => {
            start_stop::run_start(&host, &api, tracker, name.as_deref()).await?;
        }
        Commands::Stop { tracker } => start_stop::run_stop(&host, &api, tracker).await?,
        Commands::Export { format, tracker } => {
            export::run(&host, &api, format.into(), tracker).await?;
        }
        Commands::Watch { interval } => {
            let secs = interval.unwrap_or(config.watch_interval_secs).max(1);
            watch::run(&host, &api, Duration::from_secs(secs)).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config)?,
            ConfigAction::Set { key, value } => {
                commands::config::set(cli.config.as_deref(), &key, &value)?;
            }
            ConfigAction::Path => commands::config::path(cli.config.as_deref())?,
        },
    }

    Ok(())
}
