//! CLI argument definitions for acpi-extract

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "acpi-extract")]
#[command(about = "Extract ACPI tables from a BIOS image as .aml files")]
#[command(version)]
#[command(subcommand_negates_reqs = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// BIOS image to unpack with UEFIExtract
    #[arg(required_unless_present = "dump")]
    pub bios: Option<PathBuf>,

    /// Output directory (default: ./output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scan an existing UEFIExtract dump instead of unpacking an image
    #[arg(short, long, conflicts_with = "bios")]
    pub dump: Option<PathBuf>,

    /// Path to the UEFIExtract binary
    #[arg(long, env = "UEFI_EXTRACT")]
    pub uefi_extract: Option<PathBuf>,

    /// GUID of the firmware file holding the ACPI tables
    #[arg(long)]
    pub guid: Option<String>,

    /// Abort on raw section directories without a numeric ordinal
    #[arg(long)]
    pub strict: bool,

    /// List the tables that would be extracted without writing them
    #[arg(short, long)]
    pub list: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Set or show defaults
    Configure {
        /// Default UEFIExtract binary
        #[arg(long)]
        uefi_extract: Option<PathBuf>,
        /// Default output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Default firmware file GUID
        #[arg(long)]
        guid: Option<String>,
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
