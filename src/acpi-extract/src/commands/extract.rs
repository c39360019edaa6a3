//! Extract command - unpack a BIOS image and save its ACPI tables
//!
//! Runs in two phases:
//! 1. Unpack the image with UEFIExtract (skipped with `--dump`)
//! 2. Locate the ACPI firmware file(s) and write each raw section as `.aml`

use acpi_extract::{
    locate, uefi_extract, Artifact, Extractor, Options, OrdinalPolicy, Summary, TARGET_GUID,
};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::config::Config;

/// Output directory when neither the command line nor the config names one
pub const DEFAULT_OUTPUT: &str = "output";

/// Main extraction entry point
pub fn run(args: &Args, config: &Config) -> Result<()> {
    let guid = args.guid.as_deref().or(config.guid()).unwrap_or(TARGET_GUID);
    let output = args
        .output
        .clone()
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let options = Options {
        ordinal_policy: if args.strict {
            OrdinalPolicy::Abort
        } else {
            OrdinalPolicy::Skip
        },
        dry_run: args.list,
    };

    let root = match (&args.dump, &args.bios) {
        (Some(dump), _) => dump.clone(),
        (None, Some(bios)) => unpack_image(bios, args.uefi_extract.as_deref(), config, guid)?,
        (None, None) => bail!("A BIOS image or --dump directory is required"),
    };

    extract_tree(&root, &output, guid, options)?;
    Ok(())
}

/// Run UEFIExtract on the image and return the dump directory
fn unpack_image(
    bios: &Path,
    explicit_tool: Option<&Path>,
    config: &Config,
    guid: &str,
) -> Result<PathBuf> {
    if !bios.is_file() {
        bail!("BIOS file '{}' not found", bios.display());
    }

    let tool = uefi_extract::find(explicit_tool, config.uefi_extract())?;
    tracing::info!("Found UEFIExtract: {}", tool.display());

    tracing::info!("Extracting BIOS: {}", bios.display());
    uefi_extract::unpack(&tool, bios, guid)
        .with_context(|| format!("Failed to unpack {}", bios.display()))
}

/// Extract all ACPI tables below `root` into `output`
pub fn extract_tree(root: &Path, output: &Path, guid: &str, options: Options) -> Result<Summary> {
    if !options.dry_run {
        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    }

    tracing::info!("Searching for ACPI tables...");
    let subtrees =
        locate(root, guid).with_context(|| format!("Failed to scan {}", root.display()))?;

    if subtrees.is_empty() {
        println!("No ACPI tables with the target GUID found");
        return Ok(Summary::default());
    }

    let mut extractor = Extractor::new(output, options);
    for subtree in &subtrees {
        extractor
            .process_with(subtree, |artifact| report(artifact, options.dry_run))
            .with_context(|| format!("Failed to process {}", subtree.display()))?;
    }

    let summary = extractor.summary().clone();

    if summary.skipped() > 0 {
        tracing::info!(
            "Skipped {} entries ({} without body.bin, {} too short, {} unreadable, {} bad ordinal)",
            summary.skipped(),
            summary.missing_payload,
            summary.too_short,
            summary.unreadable,
            summary.malformed_ordinal
        );
    }

    if options.dry_run {
        println!(
            "{} ACPI tables would be saved to '{}'",
            summary.written,
            output.display()
        );
    } else {
        println!(
            "Extraction complete: {} ACPI tables saved to '{}'",
            summary.written,
            output.display()
        );
    }

    Ok(summary)
}

fn report(artifact: &Artifact, dry_run: bool) {
    if !dry_run {
        println!("Extracted: {}", artifact.path.display());
        return;
    }

    match &artifact.header {
        Some(header) => println!(
            "Would extract: {} (signature {:?}, revision {}, OEM {:?}, table {:?})",
            artifact.path.display(),
            header.signature,
            header.revision,
            header.oem_id,
            header.oem_table_id
        ),
        None => println!(
            "Would extract: {} (no valid header)",
            artifact.path.display()
        ),
    }
}
