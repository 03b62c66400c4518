use std::collections::HashSet;
use std::path::{Path, PathBuf};

use artifetch_archive::{ExtractOptions, TarExtractor, TarReport};
use artifetch_fetch::{
    CancellationToken, ContainerClient, DedupClientFactory, DownloadOrchestrator, DownloadReport,
    NoDedupStore, RemoteItem, ResourceLocator, StatisticsSnapshot,
};
use artifetch_pattern::PatternFilter;
use tracing::{debug, info};

use crate::artifact::BuildArtifact;
use crate::config::DownloadParameters;
use crate::error::{Error, Result};
use crate::telemetry;

/// Outcome of a provider call.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDownload {
    /// One report per downloaded artifact, in call order
    pub reports:    Vec<DownloadReport>,
    pub tars:       Option<TarReport>,
    /// Every caller-visible warning of the call
    pub warnings:   Vec<String>,
    pub statistics: StatisticsSnapshot,
}

impl ArtifactDownload {
    fn push(&mut self, report: DownloadReport) {
        self.statistics.merge(&report.statistics);
        self.warnings.extend(report.warnings.iter().cloned());
        self.reports.push(report);
    }

    /// Local paths of every file written by the call.
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.reports.iter().flat_map(|report| report.file_paths())
    }
}

/// Lists, filters, downloads and optionally unpacks container artifacts.
pub struct ArtifactProvider<C, F = NoDedupStore> {
    orchestrator: DownloadOrchestrator<C, F>,
    parameters:   DownloadParameters,
}

impl<C: ContainerClient + 'static> ArtifactProvider<C, NoDedupStore> {
    pub fn new(container: C, parameters: DownloadParameters) -> Result<Self> {
        parameters.validate()?;
        let orchestrator =
            DownloadOrchestrator::new(container).with_options(parameters.download_options());
        Ok(Self {
            orchestrator,
            parameters,
        })
    }
}

impl<C, F> ArtifactProvider<C, F>
where
    C: ContainerClient + 'static,
    F: DedupClientFactory + 'static,
{
    pub fn with_dedup_store<G>(self, factory: G) -> ArtifactProvider<C, G>
    where
        G: DedupClientFactory + 'static,
    {
        ArtifactProvider {
            orchestrator: self.orchestrator.with_dedup_store(factory),
            parameters:   self.parameters,
        }
    }

    pub fn parameters(&self) -> &DownloadParameters { &self.parameters }

    pub fn container(&self) -> &C { self.orchestrator.container() }

    /// List the artifact (with blob metadata) and apply the configured patterns.
    ///
    /// Listing order is preserved.
    pub async fn get_artifact_items(
        &self,
        artifact: &BuildArtifact,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteItem>> {
        let locator = ResourceLocator::parse(&artifact.resource_data)?;
        let items = self
            .container()
            .list_items(locator.container_id(), locator.artifact_name(), true, cancel)
            .await
            .map_err(|source| Error::Listing {
                artifact: artifact.name.clone(),
                source,
            })?;

        let filter = PatternFilter::new(
            &self.parameters.patterns,
            self.parameters.effective_match_options(),
        )?;
        let kept: Vec<RemoteItem> = filter.apply(&items).into_iter().cloned().collect();
        info!(artifact = %artifact.name, listed = items.len(), kept = kept.len(), "final results");

        let kept_paths: HashSet<&str> = kept.iter().map(|item| item.path.as_str()).collect();
        for item in items.iter().filter(|item| !kept_paths.contains(item.path.as_str())) {
            debug!(path = %item.path, "item excluded");
        }

        Ok(kept)
    }

    pub async fn download_single_artifact(
        &self,
        artifact: &BuildArtifact,
        cancel: &CancellationToken,
    ) -> Result<ArtifactDownload> {
        let target = &self.parameters.target_directory;
        let items = self.get_artifact_items(artifact, cancel).await?;

        let mut download = ArtifactDownload::default();
        download.push(self.download_items(artifact, &items, target, cancel).await?);

        if self.parameters.extract_tars {
            let paths: Vec<PathBuf> = download.file_paths().map(Path::to_path_buf).collect();
            self.extract_tars(&mut download, &paths).await?;
        }

        telemetry::emit("download_single_artifact", 1, &download.statistics);
        Ok(download)
    }

    /// Download every artifact, then extract tars once over all of them.
    pub async fn download_multiple_artifacts(
        &self,
        artifacts: &[BuildArtifact],
        cancel: &CancellationToken,
    ) -> Result<ArtifactDownload> {
        let mut download = ArtifactDownload::default();

        for artifact in artifacts {
            let dir = if self.parameters.append_artifact_name_to_target_path {
                self.parameters.target_directory.join(&artifact.name)
            } else {
                self.parameters.target_directory.clone()
            };

            let items = self.get_artifact_items(artifact, cancel).await?;
            download.push(self.download_items(artifact, &items, &dir, cancel).await?);
        }

        if self.parameters.extract_tars {
            let paths: Vec<PathBuf> = download.file_paths().map(Path::to_path_buf).collect();
            self.extract_tars(&mut download, &paths).await?;
        }

        telemetry::emit("download_multiple_artifacts", artifacts.len(), &download.statistics);
        Ok(download)
    }

    async fn download_items(
        &self,
        artifact: &BuildArtifact,
        items: &[RemoteItem],
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        info!(
            artifact = %artifact.name,
            destination = %destination.display(),
            "start downloading artifact"
        );
        Ok(self
            .orchestrator
            .download(&artifact.resource_data, items, destination, cancel)
            .await?)
    }

    async fn extract_tars(
        &self,
        download: &mut ArtifactDownload,
        paths: &[PathBuf],
    ) -> Result<()> {
        let options = ExtractOptions::default().backend(self.parameters.tar_backend);
        let extractor = TarExtractor::with_options(options);
        let root = &self.parameters.target_directory;

        let report = match &self.parameters.extracted_tars_temp_path {
            Some(scratch) => {
                let dir = scratch.clone();
                tokio::task::spawn_blocking(move || artifetch_fs::ensure_dir(dir))
                    .await
                    .map_err(|e| Error::Scratch(std::io::Error::other(e)))??;
                extractor.extract_all(paths, root, scratch).await?
            }
            None => {
                // removed on drop, after the merge into extracted_tars
                let scratch = tempfile::tempdir().map_err(Error::Scratch)?;
                extractor.extract_all(paths, root, scratch.path()).await?
            }
        };

        if let Some(warning) = &report.warning {
            download.warnings.push(warning.clone());
        }
        download.tars = Some(report);
        Ok(())
    }
}
