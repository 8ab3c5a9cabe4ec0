//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "btmanager")]
#[command(author, version, about = "Keep a local list of Bluetooth devices in sync with a backend", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List devices, serving the local cache while it is fresh
    List,

    /// Drop the local cache and reload devices from the backend
    Refresh,

    /// Store a device locally and push it to the backend
    Add {
        /// Hardware address (e.g., AA:BB:CC:DD:EE:FF)
        address: String,

        /// Device name
        #[arg(short, long, default_value = "")]
        name: String,

        /// Signal strength in dBm (omit when unknown)
        #[arg(short, long, allow_negative_numbers = true)]
        strength: Option<i32>,
    },

    /// Retry pushing every device the backend has not confirmed
    Sync,

    /// List devices paired with this machine
    Bonded {
        /// Also store each bonded device and push it to the backend
        #[arg(long)]
        save: bool,
    },

    /// Scan for nearby devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Store each discovered device and push it to the backend
        #[arg(long)]
        save: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
