//! Output file naming
//!
//! Names are derived in three tiers, from best to worst:
//! 1. Header fields: `SIGNATURE[-OEMID][-OEMTABLEID]`
//! 2. The first four payload bytes as ASCII
//! 3. The first four hex digits of those bytes

use std::collections::HashSet;

use crate::header::TableHeader;
use crate::OUTPUT_EXTENSION;

/// Bytes read for the raw signature fallback
const SIGNATURE_LEN: usize = 4;

/// Hex digits kept when the raw signature is not ASCII
const HEX_STEM_LEN: usize = 4;

/// Replace everything except ASCII alphanumerics, `-` and `_` with `_`
pub fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A sanitized OEM field carries information unless it is empty or pure padding
fn is_meaningful(token: &str) -> bool {
    !token.is_empty() && !token.chars().all(|c| c == '_')
}

/// Build the stem from decoded header fields
///
/// The signature is always present; the OEM fields are appended only when
/// they survive sanitization as something other than underscores.
pub fn header_stem(header: &TableHeader) -> String {
    let mut parts = vec![sanitize(&header.signature)];

    for field in [&header.oem_id, &header.oem_table_id] {
        let token = sanitize(field);
        if is_meaningful(&token) {
            parts.push(token);
        }
    }

    parts.join("-")
}

/// Replace only characters that cannot appear in a file name
fn path_safe(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_ascii_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Build the stem from the first four payload bytes
///
/// The ASCII decode is kept as-is apart from separators and control bytes.
/// Returns `None` when fewer than four bytes exist.
pub fn raw_stem(payload: &[u8]) -> Option<String> {
    let signature = payload.get(..SIGNATURE_LEN)?;

    if signature.is_ascii() {
        // ASCII is valid UTF-8
        let text = std::str::from_utf8(signature).ok()?;
        return Some(path_safe(text));
    }

    let mut encoded = hex::encode(signature);
    encoded.truncate(HEX_STEM_LEN);
    Some(encoded)
}

/// Derive the stem for a payload, falling back through all naming tiers
///
/// `header` is the payload's decoded header, if it has one. Returns `None`
/// only for payloads shorter than four bytes.
pub fn derive_stem(payload: &[u8], header: Option<&TableHeader>) -> Option<String> {
    match header {
        Some(header) => Some(header_stem(header)),
        None => raw_stem(payload),
    }
}

/// Names already assigned in the output directory
///
/// Collisions get numeric suffixes starting at 2: `SSDT.aml`, `SSDT2.aml`,
/// `SSDT3.aml`. Claiming a name reserves it before anything is written.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the first free file name for `stem`
    pub fn claim(&mut self, stem: &str) -> String {
        let mut counter = 1u32;
        loop {
            let name = file_name(stem, counter);
            if self.taken.insert(name.clone()) {
                return name;
            }
            counter += 1;
        }
    }

}

fn file_name(stem: &str, counter: u32) -> String {
    if counter == 1 {
        format!("{}.{}", stem, OUTPUT_EXTENSION)
    } else {
        format!("{}{}.{}", stem, counter, OUTPUT_EXTENSION)
    }
}
