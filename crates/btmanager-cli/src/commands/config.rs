//! Config command - inspect and create the configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

/// Execute the config command.
pub fn cmd_config(action: ConfigAction, path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(Config::path);

    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Show => show(&path, format),
        ConfigAction::Init { force } => init(path, force),
    }
}

fn show(path: &Path, format: OutputFormat) -> Result<()> {
    let config = Config::load_or_default(path)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            print!(
                "{}",
                toml::to_string_pretty(&config).context("Failed to serialize config")?
            );
        }
    }
    if let Err(e) = config.validate() {
        eprintln!("Warning: {}", e);
    }
    Ok(())
}

fn init(path: PathBuf, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Config file already exists at {} (use --force to overwrite)",
        path.display()
    );
    Config::default().save(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
