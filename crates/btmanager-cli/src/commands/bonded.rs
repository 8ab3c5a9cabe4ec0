//! Bonded command - list devices paired with this machine.

use anyhow::{Context, Result};
use tracing::info;

use btmanager_core::WorkerHandle;

use super::{print_devices, save_all};
use crate::cli::OutputFormat;

/// Execute the bonded command.
pub async fn cmd_bonded(worker: &WorkerHandle, save: bool, format: OutputFormat) -> Result<()> {
    let devices = worker
        .find_bonded_devices()
        .await
        .context("Failed to list bonded devices")?;

    if save && !devices.is_empty() {
        let synced = save_all(worker, &devices).await?;
        info!("Saved {} bonded device(s), {} synced", devices.len(), synced);
    }

    print_devices(&devices, format)
}
