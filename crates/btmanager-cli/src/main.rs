//! `btmanager`: keep a local list of Bluetooth devices in sync with a backend.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | List devices, from the local cache while it is fresh |
//! | `refresh` | Drop the cache and reload from the backend |
//! | `add` | Store a device and push it to the backend |
//! | `sync` | Retry pushing devices the backend has not confirmed |
//! | `bonded` | List devices paired with this machine |
//! | `scan` | Scan for nearby devices (needs the `ble` feature) |
//! | `config` | Show or create the configuration file |
//!
//! # Configuration
//!
//! Settings are read from `~/.config/btmanager/config.toml` (or the
//! platform equivalent), or from the file given with `--config`.

mod app;
mod cli;
mod commands;
mod config;
mod format;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::cli::{Cli, Commands};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Config { action } = &cli.command {
        return commands::cmd_config(action.clone(), cli.config.as_deref(), cli.format);
    }

    let config = Config::load_validated(cli.config.as_deref())?;
    let app = App::start(&config).await?;
    let worker = app.worker();

    let result = match cli.command {
        Commands::List => commands::cmd_list(worker, cli.format).await,
        Commands::Refresh => commands::cmd_refresh(worker, cli.format, cli.quiet).await,
        Commands::Add {
            address,
            name,
            strength,
        } => commands::cmd_add(worker, address, name, strength, cli.format).await,
        Commands::Sync => commands::cmd_sync(worker, cli.format).await,
        Commands::Bonded { save } => commands::cmd_bonded(worker, save, cli.format).await,
        Commands::Scan { timeout, save } => {
            commands::cmd_scan(worker, timeout, save, cli.format, cli.quiet).await
        }
        Commands::Config { .. } => Ok(()),
    };

    app.shutdown().await;
    result
}
