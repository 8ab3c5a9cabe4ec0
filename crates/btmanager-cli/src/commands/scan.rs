//! Scan command - discover nearby devices.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use btmanager_core::WorkerHandle;

use super::{print_devices, save_all};
use crate::cli::OutputFormat;

/// Execute the scan command.
pub async fn cmd_scan(
    worker: &WorkerHandle,
    timeout: u64,
    save: bool,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    if !quiet {
        info!("Scanning for devices (timeout: {}s)...", timeout);
    }

    let devices = worker
        .discover_devices(Duration::from_secs(timeout))
        .await
        .context("Scan failed")?;

    if save && !devices.is_empty() {
        let synced = save_all(worker, &devices).await?;
        info!("Saved {} discovered device(s), {} synced", devices.len(), synced);
    }

    print_devices(&devices, format)
}
