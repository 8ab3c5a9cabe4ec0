//! Command implementations for the CLI.

mod add;
mod bonded;
mod config;
mod list;
mod scan;
mod sync;

pub use add::cmd_add;
pub use bonded::cmd_bonded;
pub use config::cmd_config;
pub use list::{cmd_list, cmd_refresh};
pub use scan::cmd_scan;
pub use sync::cmd_sync;

use anyhow::Result;

use btmanager_core::{Device, WorkerHandle};

use crate::cli::OutputFormat;
use crate::format::{format_devices_json, format_devices_text};

fn print_devices(devices: &[Device], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", format_devices_json(devices)?),
        OutputFormat::Text => print!("{}", format_devices_text(devices)),
    }
    Ok(())
}

/// Store every device and push it, returning how many the backend accepted.
async fn save_all(worker: &WorkerHandle, devices: &[Device]) -> Result<usize> {
    let mut synced = 0;
    for device in devices {
        if worker.store_device(device.clone()).await?.is_synced() {
            synced += 1;
        }
    }
    Ok(synced)
}
