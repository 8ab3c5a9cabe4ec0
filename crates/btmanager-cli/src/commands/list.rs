//! List and refresh commands - read devices through the cache.

use anyhow::{Context, Result};
use tracing::info;

use btmanager_core::WorkerHandle;

use super::print_devices;
use crate::cli::OutputFormat;

/// Execute the list command.
pub async fn cmd_list(worker: &WorkerHandle, format: OutputFormat) -> Result<()> {
    let feed = worker
        .fetch_devices()
        .await
        .context("Failed to read devices")?;
    print_devices(&feed.current(), format)
}

/// Execute the refresh command.
pub async fn cmd_refresh(worker: &WorkerHandle, format: OutputFormat, quiet: bool) -> Result<()> {
    let feed = worker
        .refresh_cache()
        .await
        .context("Failed to refresh devices")?;
    let devices = feed.current();

    if devices.is_empty() && !quiet && format == OutputFormat::Text {
        // An empty list can also mean the backend was unreachable.
        info!("Backend returned no devices (or could not be reached)");
    }
    print_devices(&devices, format)
}
