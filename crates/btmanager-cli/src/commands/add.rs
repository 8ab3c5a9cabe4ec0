//! Add command - store one device and push it to the backend.

use anyhow::{Context, Result};

use btmanager_core::{Device, UNKNOWN_STRENGTH, WorkerHandle};

use crate::cli::OutputFormat;
use crate::format::{format_outcome_json, format_outcome_text};

/// Execute the add command.
pub async fn cmd_add(
    worker: &WorkerHandle,
    address: String,
    name: String,
    strength: Option<i32>,
    format: OutputFormat,
) -> Result<()> {
    let address = address.trim().to_uppercase();
    anyhow::ensure!(!address.is_empty(), "Device address cannot be empty");

    let device = Device::new(name, address.clone(), strength.unwrap_or(UNKNOWN_STRENGTH));
    let outcome = worker
        .store_device(device)
        .await
        .with_context(|| format!("Failed to store {}", address))?;

    match format {
        OutputFormat::Json => println!("{}", format_outcome_json(&address, &outcome)?),
        OutputFormat::Text => print!("{}", format_outcome_text(&address, &outcome)),
    }
    Ok(())
}
