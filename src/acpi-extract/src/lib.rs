//! ACPI table extraction from unpacked BIOS images
//!
//! UEFIExtract unpacks a firmware image into a directory tree. The ACPI tables
//! live in the raw sections of the firmware file tagged with the ACPI table
//! storage GUID:
//!
//! ```text
//! bios.bin.dump/
//!   .../
//!     0 File 7E374E25-8E01-4FEE-87F2-390C23C606CD/
//!       0 Raw section/body.bin
//!       1 Raw section/body.bin
//! ```
//!
//! Each `body.bin` is a complete ACPI table. Its 36-byte header supplies the
//! signature and OEM fields used to name the extracted `.aml` file.
//!
//! # Header Layout
//!
//! - Bytes 0-3: Signature (e.g. "DSDT")
//! - Bytes 4-7: Length
//! - Byte 8: Revision
//! - Byte 9: Checksum
//! - Bytes 10-15: OEM ID (space padded)
//! - Bytes 16-23: OEM Table ID (space padded)
//! - Bytes 24-35: OEM revision, creator ID, creator revision

mod extract;
mod header;
mod locator;
mod naming;
pub mod uefi_extract;

pub use extract::{Artifact, Extractor, Options, Summary};
pub use header::TableHeader;
pub use locator::{locate, OrdinalPolicy};

use std::path::PathBuf;

/// GUID of the firmware file UEFIExtract stores ACPI tables under
pub const TARGET_GUID: &str = "7E374E25-8E01-4FEE-87F2-390C23C606CD";

/// Name fragment UEFIExtract gives raw section directories
pub const RAW_SECTION_TOKEN: &str = "Raw section";

/// Payload file inside each raw section directory
pub const PAYLOAD_FILE: &str = "body.bin";

/// Extension of extracted tables
pub const OUTPUT_EXTENSION: &str = "aml";

/// Errors from ACPI table extraction
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data too short: need {needed} bytes, got {actual}")]
    DataTooShort { needed: usize, actual: usize },

    #[error("Header field {field} is not ASCII")]
    NonAsciiField { field: &'static str },

    #[error("Raw section directory has no numeric ordinal: {}", .path.display())]
    MalformedOrdinal { path: PathBuf },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("UEFIExtract not found (pass --uefi-extract, configure it, or put it in bin/ or PATH)")]
    ExtractorNotFound,

    #[error("UEFIExtract exited with {status}: {stderr}")]
    ExtractorFailed { status: String, stderr: String },

    #[error("UEFIExtract did not create dump directory: {}", .0.display())]
    DumpMissing(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
