//! Sync command - retry pushing unsynced devices.

use anyhow::{Context, Result};

use btmanager_core::WorkerHandle;

use crate::cli::OutputFormat;
use crate::format::{format_report_json, format_report_text};

/// Execute the sync command.
pub async fn cmd_sync(worker: &WorkerHandle, format: OutputFormat) -> Result<()> {
    let report = worker
        .synchronize_devices()
        .await
        .context("Failed to synchronize devices")?;

    match format {
        OutputFormat::Json => println!("{}", format_report_json(&report)?),
        OutputFormat::Text => print!("{}", format_report_text(&report)),
    }
    Ok(())
}
