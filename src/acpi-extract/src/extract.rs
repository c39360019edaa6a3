//! Writing ACPI tables from marked subtrees to the output directory

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::header::TableHeader;
use crate::locator::{scan_sections, OrdinalPolicy, RawSection};
use crate::naming::{derive_stem, NameRegistry};
use crate::Result;

/// Extraction settings
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Handling of raw section directories without a numeric ordinal
    pub ordinal_policy: OrdinalPolicy,
    /// Resolve names without writing anything
    pub dry_run: bool,
}

/// Running totals for one extraction
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Marked subtrees processed
    pub subtrees: usize,
    /// Tables written (or planned, in a dry run)
    pub written: usize,
    /// Raw sections without a `body.bin`
    pub missing_payload: usize,
    /// Payloads under four bytes
    pub too_short: usize,
    /// Payloads that could not be read
    pub unreadable: usize,
    /// Raw sections left out for a malformed ordinal
    pub malformed_ordinal: usize,
}

impl Summary {
    /// Entries that produced no output
    pub fn skipped(&self) -> usize {
        self.missing_payload + self.too_short + self.unreadable + self.malformed_ordinal
    }
}

/// One extracted table
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Where the table was (or would be) written
    pub path: PathBuf,
    /// Name before the collision suffix
    pub stem: String,
    /// Decoded header, if the payload had a valid one
    pub header: Option<TableHeader>,
    /// The `body.bin` it came from
    pub source: PathBuf,
}

/// Extracts tables into a single output directory
///
/// Names assigned during the lifetime of an `Extractor` never collide with
/// each other or with files already present in the output directory.
pub struct Extractor {
    output: PathBuf,
    options: Options,
    names: NameRegistry,
    summary: Summary,
}

impl Extractor {
    pub fn new<P: Into<PathBuf>>(output: P, options: Options) -> Self {
        Self {
            output: output.into(),
            options,
            names: NameRegistry::new(),
            summary: Summary::default(),
        }
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Extract every raw section of a marked subtree, returning the number written
    ///
    /// `on_artifact` is called for each table as it is written.
    pub fn process_with<F>(&mut self, subtree: &Path, mut on_artifact: F) -> Result<usize>
    where
        F: FnMut(&Artifact),
    {
        let (sections, malformed) = scan_sections(subtree, self.options.ordinal_policy)?;
        self.summary.subtrees += 1;
        self.summary.malformed_ordinal += malformed;

        tracing::debug!("{}: {} raw sections", subtree.display(), sections.len());

        let mut count = 0;
        for section in &sections {
            if let Some(artifact) = self.process_section(section)? {
                on_artifact(&artifact);
                count += 1;
            }
        }

        self.summary.written += count;
        Ok(count)
    }

    /// Handle one raw section; per-entry problems are counted, not returned
    fn process_section(&mut self, section: &RawSection) -> Result<Option<Artifact>> {
        let source = section.payload_path();
        if !source.is_file() {
            tracing::debug!("No payload in {}", section.path.display());
            self.summary.missing_payload += 1;
            return Ok(None);
        }

        let payload = match fs::read(&source) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", source.display(), e);
                self.summary.unreadable += 1;
                return Ok(None);
            }
        };

        let header = match TableHeader::from_bytes(&payload) {
            Ok(header) => Some(header),
            Err(e) => {
                tracing::debug!("{}: {}, using raw signature", source.display(), e);
                None
            }
        };

        let Some(stem) = derive_stem(&payload, header.as_ref()) else {
            tracing::debug!("Skipping {}: only {} bytes", source.display(), payload.len());
            self.summary.too_short += 1;
            return Ok(None);
        };

        let path = self.store(&stem, &payload, &source)?;

        Ok(Some(Artifact {
            path,
            stem,
            header,
            source,
        }))
    }

    /// Claim a name for `stem` and write the payload under it
    ///
    /// The file is created with create-new semantics, so a name that turns
    /// out to exist on disk is skipped and the next suffix tried.
    fn store(&mut self, stem: &str, payload: &[u8], source: &Path) -> Result<PathBuf> {
        loop {
            let path = self.output.join(self.names.claim(stem));

            if self.options.dry_run {
                if path.exists() {
                    continue;
                }
                return Ok(path);
            }

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("{} already exists", path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            file.write_all(payload)?;

            if let Err(e) = copy_metadata(source, &file) {
                tracing::warn!("Could not copy metadata to {}: {}", path.display(), e);
            }

            return Ok(path);
        }
    }
}

/// Carry modification time and permissions over from the source payload
fn copy_metadata(source: &Path, file: &File) -> std::io::Result<()> {
    let metadata = fs::metadata(source)?;
    file.set_modified(metadata.modified()?)?;
    file.set_permissions(metadata.permissions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn table(signature: &[u8; 4], oem_id: &[u8; 6], oem_table_id: &[u8; 8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(signature);
        data.extend_from_slice(&[0x00; 4]);
        data.push(0x02);
        data.push(0x00);
        data.extend_from_slice(oem_id);
        data.extend_from_slice(oem_table_id);
        data.resize(36, 0);
        data
    }

    fn empty_section(subtree: &Path, name: &str) -> PathBuf {
        let dir = subtree.join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn section(subtree: &Path, name: &str, payload: &[u8]) {
        let dir = empty_section(subtree, name);
        fs::write(dir.join("body.bin"), payload).unwrap();
    }

    fn run(extractor: &mut Extractor, subtree: &Path) -> Result<usize> {
        extractor.process_with(subtree, |_| {})
    }

    fn names_in(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_extracts_named_table() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let dsdt = table(b"DSDT", b"ABC   ", b"OEMTABLE");
        section(input.path(), "0 Raw section", &dsdt);

        let mut extractor = Extractor::new(output.path(), Options::default());
        let count = run(&mut extractor, input.path()).unwrap();

        assert_eq!(count, 1);
        let written = fs::read(output.path().join("DSDT-ABC-OEMTABLE.aml")).unwrap();
        assert_eq!(written, dsdt);
    }

    #[test]
    fn test_short_payload_skipped() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        section(input.path(), "0 Raw section", &[0x01, 0x02]);

        let mut extractor = Extractor::new(output.path(), Options::default());
        assert_eq!(run(&mut extractor, input.path()).unwrap(), 0);
        assert_eq!(extractor.summary().too_short, 1);
        assert!(names_in(output.path()).is_empty());
    }

    #[test]
    fn test_collisions_follow_ordinal_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let first = b"SSDT\x01\x02\x03".to_vec();
        let second = b"SSDT\x04\x05\x06".to_vec();
        let third = b"SSDT\x07".to_vec();
        section(input.path(), "10 Raw section", &third);
        section(input.path(), "2 Raw section", &second);
        section(input.path(), "1 Raw section", &first);

        let mut paths = Vec::new();
        let mut extractor = Extractor::new(output.path(), Options::default());
        let count = extractor
            .process_with(input.path(), |a| paths.push(a.path.clone()))
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            paths,
            vec![
                output.path().join("SSDT.aml"),
                output.path().join("SSDT2.aml"),
                output.path().join("SSDT3.aml"),
            ]
        );
        assert_eq!(fs::read(output.path().join("SSDT.aml")).unwrap(), first);
        assert_eq!(fs::read(output.path().join("SSDT2.aml")).unwrap(), second);
        assert_eq!(fs::read(output.path().join("SSDT3.aml")).unwrap(), third);
    }

    #[test]
    fn test_collisions_span_subtrees() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = input.path().join("a");
        let b = input.path().join("b");
        section(&a, "0 Raw section", b"FACP");
        section(&b, "0 Raw section", b"FACP");

        let mut extractor = Extractor::new(output.path(), Options::default());
        run(&mut extractor, &a).unwrap();
        run(&mut extractor, &b).unwrap();

        assert_eq!(
            names_in(output.path()),
            BTreeSet::from(["FACP.aml".to_string(), "FACP2.aml".to_string()])
        );
        assert_eq!(extractor.summary().subtrees, 2);
        assert_eq!(extractor.summary().written, 2);
    }

    #[test]
    fn test_existing_files_not_overwritten() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(output.path().join("APIC.aml"), b"keep").unwrap();
        section(input.path(), "0 Raw section", b"APIC\x00\x00");

        let mut extractor = Extractor::new(output.path(), Options::default());
        run(&mut extractor, input.path()).unwrap();

        assert_eq!(fs::read(output.path().join("APIC.aml")).unwrap(), b"keep");
        assert_eq!(
            fs::read(output.path().join("APIC2.aml")).unwrap(),
            b"APIC\x00\x00"
        );
    }

    #[test]
    fn test_missing_payload_and_other_sections() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        empty_section(input.path(), "0 Raw section");
        section(input.path(), "1 Raw section", b"HPET");
        section(input.path(), "2 Freeform subtype GUID section", b"BGRT");

        let mut extractor = Extractor::new(output.path(), Options::default());
        assert_eq!(run(&mut extractor, input.path()).unwrap(), 1);
        assert_eq!(extractor.summary().missing_payload, 1);
        assert_eq!(names_in(output.path()), BTreeSet::from(["HPET.aml".to_string()]));
    }

    #[test]
    fn test_payload_directory_counts_as_missing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bad = empty_section(input.path(), "0 Raw section");
        // A directory named body.bin is not a payload
        fs::create_dir(bad.join("body.bin")).unwrap();
        section(input.path(), "1 Raw section", b"MCFG");

        let mut extractor = Extractor::new(output.path(), Options::default());
        assert_eq!(run(&mut extractor, input.path()).unwrap(), 1);
        assert_eq!(extractor.summary().missing_payload, 1);
        assert!(output.path().join("MCFG.aml").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unreadable_payload_does_not_stop_run() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let bad = empty_section(input.path(), "0 Raw section");
        // Reading offset 0 of the process's own memory fails with EIO
        std::os::unix::fs::symlink("/proc/self/mem", bad.join("body.bin")).unwrap();
        section(input.path(), "1 Raw section", b"MCFG");

        let mut extractor = Extractor::new(output.path(), Options::default());
        assert_eq!(run(&mut extractor, input.path()).unwrap(), 1);
        assert_eq!(extractor.summary().unreadable, 1);
        assert_eq!(extractor.summary().missing_payload, 0);
        assert_eq!(names_in(output.path()), BTreeSet::from(["MCFG.aml".to_string()]));
    }

    #[test]
    fn test_malformed_ordinal_policies() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        section(input.path(), "0 Raw section", b"DSDT");
        section(input.path(), "Raw section", b"SSDT");

        let mut extractor = Extractor::new(output.path(), Options::default());
        assert_eq!(run(&mut extractor, input.path()).unwrap(), 1);
        assert_eq!(extractor.summary().malformed_ordinal, 1);
        assert_eq!(extractor.summary().skipped(), 1);

        let strict = Options {
            ordinal_policy: OrdinalPolicy::Abort,
            ..Options::default()
        };
        let mut extractor = Extractor::new(output.path(), strict);
        assert!(run(&mut extractor, input.path()).is_err());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let dsdt = table(b"DSDT", b"ABC   ", b"OEMTABLE");
        section(input.path(), "0 Raw section", &dsdt);
        section(input.path(), "1 Raw section", &dsdt);

        let options = Options {
            dry_run: true,
            ..Options::default()
        };
        let mut artifacts = Vec::new();
        let mut extractor = Extractor::new(output.path(), options);
        extractor
            .process_with(input.path(), |a| artifacts.push(a.clone()))
            .unwrap();

        assert!(names_in(output.path()).is_empty());
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[1].path, output.path().join("DSDT-ABC-OEMTABLE2.aml"));
        let header = artifacts[0].header.as_ref().unwrap();
        assert_eq!(header.revision, 2);
        assert_eq!(artifacts[0].stem, "DSDT-ABC-OEMTABLE");
    }

    #[test]
    fn test_idempotent_names() {
        let input = TempDir::new().unwrap();
        section(input.path(), "0 Raw section", b"SSDT\x00\x00");
        section(input.path(), "1 Raw section", &[0xde, 0xad, 0xbe, 0xef]);
        section(input.path(), "2 Raw section", b"SSDT\x01");

        let run = || {
            let output = TempDir::new().unwrap();
            let mut extractor = Extractor::new(output.path(), Options::default());
            let mut names = Vec::new();
            extractor
                .process_with(input.path(), |a| {
                    names.push(a.path.file_name().unwrap().to_string_lossy().into_owned())
                })
                .unwrap();
            names
        };

        let first = run();
        assert_eq!(first, vec!["SSDT.aml", "dead.aml", "SSDT2.aml"]);
        assert_eq!(first, run());
    }
}
