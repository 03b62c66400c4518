//! Download parameters, loadable from TOML.

use std::path::{Path, PathBuf};

use artifetch_archive::{EXTRACTED_TARS_DIR, TarBackend};
use artifetch_fetch::{DEFAULT_PARALLELISM, DEFAULT_RETRY_COUNT, DownloadOptions};
use artifetch_pattern::MatchOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything a provider call needs to know besides the artifacts.
///
/// # Example
///
/// ```
/// use artifetch::DownloadParameters;
///
/// let parameters = DownloadParameters::from_toml_str(
///     r#"
///     target_directory = "/tmp/drop"
///     patterns = ["**", "!**/*.pdb"]
///     parallelism = 4
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(parameters.parallelism, 4);
/// assert_eq!(parameters.retry_download_count, 4);
/// assert!(parameters.append_artifact_name_to_target_path);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadParameters {
    pub target_directory:                    PathBuf,
    /// Ordered include/exclude globs; see [`PatternFilter`](artifetch_pattern::PatternFilter)
    pub patterns:                            Vec<String>,
    /// Falls back to [`MatchOptions::artifact_defaults`] when unset
    pub match_options:                       Option<MatchOptions>,
    pub parallelism:                         usize,
    pub retry_download_count:                u32,
    pub check_downloaded_files:              bool,
    pub extract_tars:                        bool,
    pub tar_backend:                         TarBackend,
    /// Scratch directory for extraction; a temporary directory when unset
    pub extracted_tars_temp_path:            Option<PathBuf>,
    pub include_artifact_name_in_path:       bool,
    /// Multi-artifact downloads go to `target/<artifact name>`
    pub append_artifact_name_to_target_path: bool,
    /// Global switch for the dedup-store transport
    pub dedup_enabled:                       bool,
}

impl Default for DownloadParameters {
    fn default() -> Self {
        Self {
            target_directory:                    PathBuf::new(),
            patterns:                            vec!["**".to_owned()],
            match_options:                       None,
            parallelism:                         DEFAULT_PARALLELISM,
            retry_download_count:                DEFAULT_RETRY_COUNT,
            check_downloaded_files:              false,
            extract_tars:                        false,
            tar_backend:                         TarBackend::default(),
            extracted_tars_temp_path:            None,
            include_artifact_name_in_path:       false,
            append_artifact_name_to_target_path: true,
            dedup_enabled:                       true,
        }
    }
}

impl DownloadParameters {
    pub fn new(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_directory: target_directory.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> { Ok(toml::from_str(source)?) }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_directory.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("target_directory must be set".to_owned()));
        }
        if self.parallelism == 0 {
            return Err(Error::InvalidConfig("parallelism must be at least 1".to_owned()));
        }
        if self.extract_tars {
            if let Some(scratch) = &self.extracted_tars_temp_path {
                if scratch.starts_with(self.target_directory.join(EXTRACTED_TARS_DIR)) {
                    let message = format!(
                        "extracted_tars_temp_path {} is inside {EXTRACTED_TARS_DIR}",
                        scratch.display()
                    );
                    return Err(Error::InvalidConfig(message));
                }
            }
        }
        Ok(())
    }

    pub fn patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = Some(options);
        self
    }

    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn retry_download_count(mut self, count: u32) -> Self {
        self.retry_download_count = count;
        self
    }

    pub fn check_downloaded_files(mut self, check: bool) -> Self {
        self.check_downloaded_files = check;
        self
    }

    pub fn extract_tars(mut self, extract: bool) -> Self {
        self.extract_tars = extract;
        self
    }

    pub fn tar_backend(mut self, backend: TarBackend) -> Self {
        self.tar_backend = backend;
        self
    }

    pub fn extracted_tars_temp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.extracted_tars_temp_path = Some(path.into());
        self
    }

    pub fn include_artifact_name_in_path(mut self, include: bool) -> Self {
        self.include_artifact_name_in_path = include;
        self
    }

    pub fn append_artifact_name_to_target_path(mut self, append: bool) -> Self {
        self.append_artifact_name_to_target_path = append;
        self
    }

    pub fn dedup_enabled(mut self, enabled: bool) -> Self {
        self.dedup_enabled = enabled;
        self
    }

    /// Options the pattern filter runs with.
    pub fn effective_match_options(&self) -> MatchOptions {
        self.match_options.unwrap_or_else(MatchOptions::artifact_defaults)
    }

    /// Options handed to the download orchestrator.
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions::default()
            .parallelism(self.parallelism)
            .retry_count(self.retry_download_count)
            .check_integrity(self.check_downloaded_files)
            .include_artifact_name_in_path(self.include_artifact_name_in_path)
            .dedup_enabled(self.dedup_enabled)
    }
}
