//! Running UEFIExtract to unpack a BIOS image
//!
//! UEFIExtract writes its tree next to the input as `<image>.dump`. Only the
//! firmware file matching the requested GUID is unpacked.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result};

/// Executable names tried in each search directory
const BINARY_NAMES: &[&str] = &["UEFIExtract", "UEFIExtract.exe"];

/// Find the UEFIExtract binary
///
/// Search order: `explicit`, then `configured`, then `bin/` beside the running
/// executable, then each directory on `PATH`.
pub fn find(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
    for path in [explicit, configured].into_iter().flatten() {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Ignoring {}: not an executable file", path.display());
    }

    let exe_bin = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("bin")));

    let path_dirs = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    search_dirs(exe_bin.into_iter().chain(path_dirs)).ok_or(Error::ExtractorNotFound)
}

fn search_dirs<I: IntoIterator<Item = PathBuf>>(dirs: I) -> Option<PathBuf> {
    dirs.into_iter()
        .flat_map(|dir| BINARY_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Directory UEFIExtract creates for `image`
pub fn dump_dir(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(".dump");
    PathBuf::from(name)
}

/// Unpack the firmware file tagged `guid` from `image`, returning the dump root
///
/// A dump left over from an earlier run is removed first.
pub fn unpack(uefi_extract: &Path, image: &Path, guid: &str) -> Result<PathBuf> {
    let dump = dump_dir(image);

    if dump.exists() {
        tracing::info!("Removing previous dump: {}", dump.display());
        std::fs::remove_dir_all(&dump)?;
    }

    tracing::debug!(
        "Running {} {} {}",
        uefi_extract.display(),
        image.display(),
        guid
    );

    let output = Command::new(uefi_extract).arg(image).arg(guid).output()?;

    if !output.status.success() {
        return Err(Error::ExtractorFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if !dump.is_dir() {
        return Err(Error::DumpMissing(dump));
    }

    Ok(dump)
}
