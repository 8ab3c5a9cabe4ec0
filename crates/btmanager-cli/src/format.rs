//! Output formatting for text and JSON output.

use anyhow::Result;
use serde::Serialize;

use btmanager_core::{Device, StoreOutcome, SyncReport};
use btmanager_types::display_timestamp;

/// How `created_at` is shown in text output.
const DISPLAY_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

/// A device as printed in JSON, including local sync status.
#[derive(Serialize)]
struct DeviceRow<'a> {
    #[serde(flatten)]
    device: &'a Device,
    synced: bool,
}

impl<'a> From<&'a Device> for DeviceRow<'a> {
    fn from(device: &'a Device) -> Self {
        Self {
            device,
            synced: device.sync_state,
        }
    }
}

fn strength_label(device: &Device) -> String {
    if device.has_strength() {
        format!("{} dBm", device.strength)
    } else {
        "-".to_string()
    }
}

fn name_label(device: &Device) -> &str {
    if device.name.is_empty() {
        "(unnamed)"
    } else {
        &device.name
    }
}

/// Format a device list as an aligned table.
pub fn format_devices_text(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "No devices.\n".to_string();
    }

    let name_width = devices
        .iter()
        .map(|d| name_label(d).chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let address_width = devices
        .iter()
        .map(|d| d.address.len())
        .max()
        .unwrap_or(0)
        .max(7);

    let mut out = format!(
        "{:<aw$}  {:<nw$}  {:>9}  {:<19}  {}\n",
        "ADDRESS",
        "NAME",
        "STRENGTH",
        "CREATED",
        "SYNCED",
        aw = address_width,
        nw = name_width,
    );
    for device in devices {
        out.push_str(&format!(
            "{:<aw$}  {:<nw$}  {:>9}  {:<19}  {}\n",
            device.address,
            name_label(device),
            strength_label(device),
            display_timestamp(&device.created_at, DISPLAY_FORMAT),
            if device.sync_state { "yes" } else { "no" },
            aw = address_width,
            nw = name_width,
        ));
    }
    out
}

/// Format a device list as pretty-printed JSON.
pub fn format_devices_json(devices: &[Device]) -> Result<String> {
    let rows: Vec<DeviceRow<'_>> = devices.iter().map(DeviceRow::from).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn format_outcome_text(address: &str, outcome: &StoreOutcome) -> String {
    match outcome {
        StoreOutcome::Synced(device) => format!("Synced {}\n", device.address),
        StoreOutcome::LocalOnly => format!(
            "Saved {} locally; the backend did not accept it. Run `btmanager sync` to retry.\n",
            address
        ),
    }
}

pub fn format_outcome_json(address: &str, outcome: &StoreOutcome) -> Result<String> {
    let value = serde_json::json!({
        "address": address,
        "synced": outcome.is_synced(),
        "device": outcome.synced_device().map(DeviceRow::from),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn format_report_text(report: &SyncReport) -> String {
    if report.attempted == 0 {
        return "Everything is synced.\n".to_string();
    }
    format!(
        "Synced {} of {} device(s), {} pending.\n",
        report.synced,
        report.attempted,
        report.pending()
    )
}

pub fn format_report_json(report: &SyncReport) -> Result<String> {
    let value = serde_json::json!({
        "attempted": report.attempted,
        "synced": report.synced,
        "pending": report.pending(),
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
