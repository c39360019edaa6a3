//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting acpi-extract defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Handle the configure command
///
/// # Arguments
/// * `uefi_extract` - Default UEFIExtract binary
/// * `output` - Default output directory
/// * `guid` - Default firmware file GUID
/// * `show` - If true, show current configuration
pub fn handle(
    uefi_extract: Option<PathBuf>,
    output: Option<PathBuf>,
    guid: Option<String>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if uefi_extract.is_none() && output.is_none() && guid.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, uefi_extract, output, guid);
    config.save()?;

    println!("Configuration updated");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Overwrite the settings that were given
fn apply(
    config: &mut Config,
    uefi_extract: Option<PathBuf>,
    output: Option<PathBuf>,
    guid: Option<String>,
) {
    if uefi_extract.is_some() {
        config.uefi_extract = uefi_extract;
    }
    if output.is_some() {
        config.output = output;
    }
    if guid.is_some() {
        config.guid = guid;
    }
}

/// Display current configuration
fn show_config(config: &Config) {
    match config.uefi_extract() {
        Some(path) => println!("UEFIExtract: {}", path.display()),
        None => println!("UEFIExtract: (search bin/ and PATH)"),
    }
    match config.output() {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: {} (default)", super::extract::DEFAULT_OUTPUT),
    }
    match config.guid() {
        Some(guid) => println!("GUID: {}", guid),
        None => println!("GUID: {} (default)", acpi_extract::TARGET_GUID),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: acpi-extract configure [--uefi-extract PATH] [--output DIR] [--guid GUID]");
    println!("       acpi-extract configure --show");
}
