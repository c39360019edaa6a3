//! Finding ACPI raw sections in a UEFIExtract dump

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result, PAYLOAD_FILE, RAW_SECTION_TOKEN};

/// What to do with a raw section directory whose name has no leading ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrdinalPolicy {
    /// Log a warning and leave the entry out
    #[default]
    Skip,
    /// Fail the whole run
    Abort,
}

/// A raw section directory of a marked firmware file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawSection {
    /// UEFIExtract's index for this section
    pub ordinal: u64,
    /// Directory holding the section
    pub path: PathBuf,
}

impl RawSection {
    /// Path of the section's `body.bin`
    pub fn payload_path(&self) -> PathBuf {
        self.path.join(PAYLOAD_FILE)
    }
}

/// Find every directory below `root` whose name contains `marker` (case-insensitive)
///
/// The walk is depth-first in file name order and continues into matched
/// directories. An empty result is not an error.
pub fn locate(root: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let marker = marker.to_lowercase();
    let mut found = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.contains(&marker) {
            tracing::debug!("Marked directory: {}", entry.path().display());
            found.push(entry.into_path());
        }
    }

    Ok(found)
}

/// Parse the leading whitespace-delimited ordinal of a section directory name
///
/// "3 Raw section" -> 3
pub(crate) fn parse_ordinal(name: &str) -> Option<u64> {
    name.split_whitespace().next()?.parse().ok()
}

/// List the raw section directories of a marked subtree in ordinal order
///
/// Only immediate child directories whose name contains "Raw section" are
/// considered. Equal ordinals are ordered by directory name. Also returns how
/// many entries were skipped for a malformed ordinal.
pub(crate) fn scan_sections(
    subtree: &Path,
    policy: OrdinalPolicy,
) -> Result<(Vec<RawSection>, usize)> {
    let mut sections = Vec::new();
    let mut malformed = 0;

    for entry in std::fs::read_dir(subtree)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.contains(RAW_SECTION_TOKEN) {
            continue;
        }

        let Some(ordinal) = parse_ordinal(&name) else {
            if policy == OrdinalPolicy::Abort {
                return Err(Error::MalformedOrdinal { path: entry.path() });
            }
            tracing::warn!(
                "Skipping raw section without numeric ordinal: {}",
                entry.path().display()
            );
            malformed += 1;
            continue;
        };

        sections.push(RawSection {
            ordinal,
            path: entry.path(),
        });
    }

    sections.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.path.cmp(&b.path)));
    Ok((sections, malformed))
}
