use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::options::{ExtractOptions, TarBackend};

mod builtin;
mod system;

/// Folder below the destination root that receives extracted content.
pub const EXTRACTED_TARS_DIR: &str = "extracted_tars";

/// Warning returned when nothing among the downloaded files is a tar archive.
pub const NO_TARS_FOUND: &str = "no tar archives were found among the downloaded files";

/// Whether `path` names a tar archive (plain `.tar` suffix, case-sensitive).
pub fn is_tar_archive(path: &Path) -> bool { path.to_string_lossy().ends_with(".tar") }

/// What [`TarExtractor::extract_all`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarReport {
    /// Archives extracted, in input order
    pub archives: Vec<PathBuf>,
    /// `extracted_tars` folder the content ended up in, when any archive was found
    pub target:   Option<PathBuf>,
    pub warning:  Option<String>,
    pub merge:    artifetch_fs::MergeReport,
}

impl TarReport {
    pub fn count(&self) -> usize { self.archives.len() }
}

/// Finds tar archives among downloaded files and unpacks them.
///
/// Each archive is extracted into `scratch_dir`, below the same relative
/// directory it had under the destination root, and then deleted. Once all
/// archives are done the scratch tree is merged into
/// `<destination_root>/extracted_tars`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarExtractor {
    options: ExtractOptions,
}

impl TarExtractor {
    pub fn new() -> Self { Self::default() }

    pub fn with_options(options: ExtractOptions) -> Self { Self { options } }

    pub fn backend(mut self, backend: TarBackend) -> Self {
        self.options.backend = backend;
        self
    }

    pub fn options(&self) -> &ExtractOptions { &self.options }

    pub async fn extract_all<I, P>(
        &self,
        file_paths: I,
        destination_root: &Path,
        scratch_dir: &Path,
    ) -> Result<TarReport>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        info!(root = %destination_root.display(), "searching for tar archives");

        let mut report = TarReport::default();
        for path in file_paths {
            let archive = path.as_ref();
            if !is_tar_archive(archive) {
                continue;
            }

            let relative = archive
                .strip_prefix(destination_root)
                .map_err(|_| Error::OutsideRoot {
                    archive: archive.to_path_buf(),
                    root:    destination_root.to_path_buf(),
                })?;
            let extract_dir = match relative.parent() {
                Some(parent) => scratch_dir.join(parent),
                None => scratch_dir.to_path_buf(),
            };

            self.extract_one(archive, &extract_dir).await?;

            if self.options.delete_archives {
                tokio::fs::remove_file(archive)
                    .await
                    .map_err(|e| Error::io(archive, e))?;
            }
            report.archives.push(archive.to_path_buf());
        }

        if report.archives.is_empty() {
            warn!("{NO_TARS_FOUND}");
            report.warning = Some(NO_TARS_FOUND.to_owned());
            return Ok(report);
        }

        info!(count = report.count(), "extracted tar archives");

        let target = destination_root.join(EXTRACTED_TARS_DIR);
        let scratch = scratch_dir.to_path_buf();
        let merge_target = target.clone();
        report.merge =
            tokio::task::spawn_blocking(move || artifetch_fs::merge_dir(scratch, merge_target))
                .await
                .map_err(|e| Error::Worker(e.to_string()))??;
        debug!(merge = ?report.merge, target = %target.display(), "moved extracted content");
        report.target = Some(target);

        Ok(report)
    }

    async fn extract_one(&self, archive: &Path, extract_dir: &Path) -> Result<()> {
        info!(
            archive = %archive.display(),
            backend = ?self.options.backend,
            "extracting tar archive"
        );

        let dir = extract_dir.to_path_buf();
        tokio::task::spawn_blocking(move || artifetch_fs::ensure_dir(dir))
            .await
            .map_err(|e| Error::Worker(e.to_string()))??;

        match self.options.backend {
            TarBackend::System => system::extract(archive, extract_dir).await,
            TarBackend::Builtin => {
                let archive = archive.to_path_buf();
                let dir = extract_dir.to_path_buf();
                tokio::task::spawn_blocking(move || builtin::extract(&archive, &dir))
                    .await
                    .map_err(|e| Error::Worker(e.to_string()))?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tar_suffix() {
        assert!(is_tar_archive(Path::new("/out/a/images.tar")));
        assert!(!is_tar_archive(Path::new("/out/a/images.tar.gz")));
        assert!(!is_tar_archive(Path::new("/out/a/images.TAR")));
        assert!(!is_tar_archive(Path::new("/out/a/tar")));
    }
}
