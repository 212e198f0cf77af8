//! Zip extraction with the template relocation rules.
//!
//! Rules match on the entry's base filename only, case-sensitively:
//!
//! - `.gitignore` is skipped
//! - `README.md` is written to `scripts/README.md` under the target root
//! - everything else keeps its path inside the archive
//!
//! A nested `docs/README.md` is therefore relocated too, and a nested
//! `.gitignore` skipped.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::ZipArchive;

use crate::cms::error::{CmsError, CmsResult};

/// Entries with this base name are never extracted.
pub const IGNORED_FILE_NAME: &str = ".gitignore";

/// Entries with this base name are moved into [`RELOCATION_DIR`].
pub const RELOCATED_FILE_NAME: &str = "README.md";

/// Directory under the target root receiving relocated entries.
pub const RELOCATION_DIR: &str = "scripts";

/// What happened to each archive entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Entries written at their archive path.
    pub extracted: Vec<String>,
    /// Entries written into the relocation directory.
    pub relocated: Vec<String>,
    /// Entries skipped by name.
    pub skipped: Vec<String>,
    /// Entries refused because their path escapes the target root.
    pub rejected: Vec<String>,
}

/// Extracts `zip_path` into `target`, applying the relocation rules.
///
/// # Errors
///
/// Returns [`CmsError::Archive`] for an unreadable archive and
/// [`CmsError::Io`] if a file or directory cannot be written.
pub fn extract_archive(zip_path: &Path, target: &Path) -> CmsResult<ExtractionSummary> {
    let file = File::open(zip_path).map_err(|e| CmsError::io(zip_path, e))?;
    let mut archive = ZipArchive::new(file)?;
    let mut summary = ExtractionSummary::default();

    tracing::debug!(
        entries = archive.len(),
        target = %target.display(),
        "Extracting archive"
    );

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = %name, "Refusing archive entry outside target directory");
            summary.rejected.push(name);
            continue;
        };

        if entry.is_dir() {
            create_dir(&target.join(&relative))?;
            continue;
        }

        match relative.file_name().and_then(OsStr::to_str) {
            Some(IGNORED_FILE_NAME) => {
                tracing::debug!(entry = %name, "Skipping");
                summary.skipped.push(name);
            }
            Some(RELOCATED_FILE_NAME) => {
                let dir = target.join(RELOCATION_DIR);
                create_dir(&dir)?;
                write_entry(&mut entry, &dir.join(RELOCATED_FILE_NAME))?;
                tracing::debug!(entry = %name, "Moved to scripts/ directory");
                summary.relocated.push(name);
            }
            _ => {
                let dest: PathBuf = target.join(&relative);
                if let Some(parent) = dest.parent() {
                    create_dir(parent)?;
                }
                write_entry(&mut entry, &dest)?;
                summary.extracted.push(name);
            }
        }
    }

    Ok(summary)
}

fn create_dir(path: &Path) -> CmsResult<()> {
    fs::create_dir_all(path).map_err(|e| CmsError::io(path, e))
}

fn write_entry(entry: &mut impl io::Read, dest: &Path) -> CmsResult<()> {
    let mut out = File::create(dest).map_err(|e| CmsError::io(dest, e))?;
    io::copy(entry, &mut out).map_err(|e| CmsError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn applies_relocation_rules() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("site.zip");
        let target = dir.path().join("project");
        write_zip(
            &zip_path,
            &[
                ("a/", ""),
                ("a/.gitignore", "node_modules\n"),
                ("a/README.md", "# Builder\n"),
                ("a/index.html", "<html></html>"),
            ],
        );

        let summary = extract_archive(&zip_path, &target).unwrap();

        assert_eq!(
            fs::read(target.join("scripts/README.md")).unwrap(),
            b"# Builder\n"
        );
        assert_eq!(
            fs::read(target.join("a/index.html")).unwrap(),
            b"<html></html>"
        );
        assert!(!target.join("a/.gitignore").exists());
        assert!(!target.join("a/README.md").exists());
        assert_eq!(summary.skipped, ["a/.gitignore"]);
        assert_eq!(summary.relocated, ["a/README.md"]);
        assert_eq!(summary.extracted, ["a/index.html"]);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("site.zip");
        let target = dir.path().join("project");
        write_zip(&zip_path, &[("readme.md", "lower"), (".GITIGNORE", "x")]);

        let summary = extract_archive(&zip_path, &target).unwrap();

        assert!(target.join("readme.md").exists());
        assert!(target.join(".GITIGNORE").exists());
        assert!(!target.join(RELOCATION_DIR).exists());
        assert_eq!(summary.extracted.len(), 2);
    }

    #[test]
    fn entries_escaping_target_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("site.zip");
        let target = dir.path().join("project");
        write_zip(
            &zip_path,
            &[
                ("../evil.txt", "outside"),
                ("/abs.txt", "absolute"),
                ("ok.txt", "inside"),
            ],
        );

        let summary = extract_archive(&zip_path, &target).unwrap();

        assert_eq!(summary.rejected, ["../evil.txt", "/abs.txt"]);
        assert_eq!(summary.extracted, ["ok.txt"]);
        assert!(!dir.path().join("evil.txt").exists());
        assert!(!target.join("abs.txt").exists());
        assert_eq!(
            fs::read_dir(&target).unwrap().count(),
            1,
            "only ok.txt is written"
        );
    }

    #[test]
    fn not_a_zip_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        fs::write(&zip_path, b"definitely not a zip").unwrap();

        let err = extract_archive(&zip_path, dir.path()).unwrap_err();
        assert!(matches!(err, CmsError::Archive { .. }));
    }

    #[test]
    fn missing_archive_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_archive(&dir.path().join("nope.zip"), dir.path()).unwrap_err();
        assert!(matches!(err, CmsError::Io { .. }));
    }
}
