//! acpi-extract - save the ACPI tables of a BIOS image as .aml files

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;

use cli::{Args, Commands};
use config::Config;

fn main() -> Result<()> {
    let mut args = Args::parse();
    init_tracing(args.verbose);

    if let Some(command) = args.command.take() {
        return match command {
            Commands::Configure {
                uefi_extract,
                output,
                guid,
                show,
            } => commands::configure::handle(uefi_extract, output, guid, show),
        };
    }

    let config = Config::load()?;
    commands::extract::run(&args, &config)
}

/// Log to stderr; stdout is reserved for the list of extracted tables
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "acpi_extract=debug"
    } else {
        "acpi_extract=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
