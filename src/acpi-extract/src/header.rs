//! ACPI table header decoding

use crate::{Error, Result};

/// Header size in bytes
pub const HEADER_SIZE: usize = 36;

// Field offsets
const SIGNATURE: std::ops::Range<usize> = 0..4;
const REVISION: usize = 8;
const OEM_ID: std::ops::Range<usize> = 10..16;
const OEM_TABLE_ID: std::ops::Range<usize> = 16..24;

/// Identifying fields of a standard ACPI table header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// Table signature (e.g., "DSDT", "SSDT")
    pub signature: String,
    /// Table revision (not used for naming)
    pub revision: u8,
    /// OEM ID with trailing padding removed
    pub oem_id: String,
    /// OEM Table ID with trailing padding removed
    pub oem_table_id: String,
}

impl TableHeader {
    /// Parse the header from the start of a table payload
    ///
    /// Fails when fewer than 36 bytes are available or when the signature or
    /// either OEM field contains non-ASCII bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::DataTooShort {
                needed: HEADER_SIZE,
                actual: data.len(),
            });
        }

        Ok(Self {
            signature: ascii_field(&data[SIGNATURE], "signature")?.to_string(),
            revision: data[REVISION],
            oem_id: ascii_field(&data[OEM_ID], "oem_id")?.trim_end().to_string(),
            oem_table_id: ascii_field(&data[OEM_TABLE_ID], "oem_table_id")?
                .trim_end()
                .to_string(),
        })
    }
}

fn ascii_field<'a>(bytes: &'a [u8], field: &'static str) -> Result<&'a str> {
    if !bytes.is_ascii() {
        return Err(Error::NonAsciiField { field });
    }
    std::str::from_utf8(bytes).map_err(|_| Error::NonAsciiField { field })
}
