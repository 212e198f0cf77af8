//! Starter project staging.
//!
//! Downloads a template archive and materialises it into a project
//! directory:
//!
//! 1. **Select**: resolve the [`Flavor`] (rejected before any network call)
//! 2. **Download**: stream the archive into a uniquely named temp file
//! 3. **Extract**: apply the rules in [`extract`]
//! 4. **Clean up**: the temp file is removed on every exit path
//!
//! Each staging run owns its temp file, so concurrent runs do not collide.

pub mod extract;
pub mod flavor;

pub use extract::{extract_archive, ExtractionSummary};
pub use flavor::Flavor;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::cms::error::{CmsError, CmsResult};
use crate::config::{CmsConfig, TemplateConfig};

/// Prefix of the temporary archive file name.
pub const TEMP_FILE_PREFIX: &str = "website-base-";

/// Outcome of a staging run.
#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    /// Template flavor that was staged.
    pub flavor: Flavor,
    /// Archive URL.
    pub source_url: String,
    /// Project root the archive was extracted into.
    pub target: PathBuf,
    /// Size of the downloaded archive.
    pub downloaded_bytes: u64,
    /// Per-entry results.
    #[serde(flatten)]
    pub summary: ExtractionSummary,
    /// Whether the temporary archive was deleted.
    pub temp_file_removed: bool,
}

/// Downloads and extracts starter templates.
#[derive(Debug, Clone)]
pub struct ArchiveStager {
    http: reqwest::Client,
    templates: TemplateConfig,
    /// Where downloads are buffered; the system temp dir when `None`.
    temp_dir: Option<PathBuf>,
}

impl ArchiveStager {
    /// Creates a stager using the configured template locations.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        Ok(Self::with_http_client(crate::cms::http_client()?, config))
    }

    /// Creates a stager around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, config: &CmsConfig) -> Self {
        Self {
            http,
            templates: config.templates.clone(),
            temp_dir: None,
        }
    }

    /// Buffers downloads in `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Archive URL for `flavor`.
    #[must_use]
    pub fn source_url(&self, flavor: Flavor) -> &str {
        flavor.source_url(&self.templates)
    }

    /// Stages the template named `lang` into `root`.
    ///
    /// # Errors
    ///
    /// Returns [`CmsError::InvalidFlavor`] for an unknown `lang` without
    /// touching the network, otherwise see [`ArchiveStager::stage_flavor`].
    pub async fn stage(&self, lang: &str, root: &Path) -> CmsResult<StagingReport> {
        let flavor: Flavor = lang.parse()?;
        self.stage_flavor(flavor, root).await
    }

    /// Stages `flavor` into `root`.
    ///
    /// # Errors
    ///
    /// - [`CmsError::Transport`] / [`CmsError::Http`] if the download fails
    /// - [`CmsError::Archive`] if the archive cannot be read
    /// - [`CmsError::Io`] if the temp file or project files cannot be written
    pub async fn stage_flavor(&self, flavor: Flavor, root: &Path) -> CmsResult<StagingReport> {
        let source_url = self.source_url(flavor).to_string();
        tracing::info!(%flavor, url = %source_url, root = %root.display(), "Staging starter template");

        let (archive, downloaded_bytes) = self.download(&source_url).await?;

        // `archive` is deleted on drop if extraction fails.
        let summary = extract_archive(archive.path(), root)?;

        let temp_path = archive.path().to_path_buf();
        let temp_file_removed = match archive.close() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary archive");
                false
            }
        };

        tracing::info!(
            extracted = summary.extracted.len(),
            relocated = summary.relocated.len(),
            skipped = summary.skipped.len(),
            "Starter template staged"
        );

        Ok(StagingReport {
            flavor,
            source_url,
            target: root.to_path_buf(),
            downloaded_bytes,
            summary,
            temp_file_removed,
        })
    }

    /// Streams `url` into a fresh temp file.
    ///
    /// The status is checked before the file is created.
    async fn download(&self, url: &str) -> CmsResult<(NamedTempFile, u64)> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CmsError::transport(url, e))?;
        let mut response = crate::cms::check_status(response, url).await?;

        let temp_dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".zip")
            .tempfile_in(&temp_dir)
            .map_err(|e| CmsError::io(temp_dir, e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CmsError::transport(url, e))?
        {
            file.write_all(&chunk)
                .map_err(|e| CmsError::io(file.path(), e))?;
            written += chunk.len() as u64;
        }
        file.flush().map_err(|e| CmsError::io(file.path(), e))?;

        tracing::debug!(bytes = written, path = %file.path().display(), "Download completed");
        Ok((file, written))
    }
}
