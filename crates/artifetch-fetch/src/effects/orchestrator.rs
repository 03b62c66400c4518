//! The download pipeline for one artifact.
//!
//! folders (concurrently) → transport decision → bounded worker pool →
//! aggregation → optional integrity check.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{RetryPolicy, dedup_fallback_warning, resolve_target_path};
use crate::data::{
    Compression, DownloadOptions, DownloadOutcome, DownloadReport, DownloadStatistics, RemoteItem,
    ResourceLocator, Transport,
};
use crate::effects::integrity::verify_integrity;
use crate::effects::retry::{RetryExecutor, Retryable};
use crate::effects::transport::{
    ContainerClient, DedupClientFactory, DedupStoreClient, NoDedupStore,
};
use crate::effects::writer::{write_gzip_stream, write_stream};
use crate::error::{FetchError, Result, TransportError};

/// Retry bound for a single dedup-store fetch.
pub const DEDUP_MAX_RETRIES: u32 = 3;

/// Downloads filtered artifact items to local disk.
///
/// The dedup store is optional; without one (or when it cannot be reached)
/// every file is streamed from the container.
pub struct DownloadOrchestrator<C, F = NoDedupStore> {
    container: Arc<C>,
    dedup:     Option<Arc<F>>,
    options:   DownloadOptions,
}

impl<C: ContainerClient + 'static> DownloadOrchestrator<C, NoDedupStore> {
    pub fn new(container: C) -> Self {
        Self {
            container: Arc::new(container),
            dedup:     None,
            options:   DownloadOptions::default(),
        }
    }
}

impl<C, F> DownloadOrchestrator<C, F>
where
    C: ContainerClient + 'static,
    F: DedupClientFactory + 'static,
{
    /// Prefer the dedup store for items that carry a blob reference.
    pub fn with_dedup_store<G: DedupClientFactory + 'static>(
        self,
        factory: G,
    ) -> DownloadOrchestrator<C, G> {
        DownloadOrchestrator {
            container: self.container,
            dedup:     Some(Arc::new(factory)),
            options:   self.options,
        }
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DownloadOptions { &self.options }

    pub fn container(&self) -> &C { &self.container }

    /// Download `items` (already filtered) below `destination`.
    ///
    /// Individual file failures do not stop their siblings; once every
    /// admitted file has an outcome, any failure fails the call with
    /// [`FetchError::DownloadsFailed`], which carries the full report.
    pub async fn download(
        &self,
        resource_data: &str,
        items: &[RemoteItem],
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport> {
        let locator = ResourceLocator::parse(resource_data)?;
        let (folders, files): (Vec<&RemoteItem>, Vec<&RemoteItem>) =
            items.iter().partition(|item| item.is_folder());

        info!(
            artifact = locator.artifact_name(),
            folders = folders.len(),
            files = files.len(),
            destination = %destination.display(),
            "downloading artifact items"
        );

        let stats = Arc::new(DownloadStatistics::new());
        let mut report = DownloadReport {
            artifact_name: locator.artifact_name().to_owned(),
            destination: destination.to_path_buf(),
            ..DownloadReport::default()
        };

        report.folders_created = self
            .create_folders(&locator, &folders, !items.is_empty(), destination, cancel)
            .await?;
        stats.record_folders(report.folders_created as u64);

        let dedup = self.connect_dedup(&files, &mut report.warnings, cancel).await?;
        report.dedup_active = dedup.is_some();

        let files: Vec<RemoteItem> = files.into_iter().cloned().collect();
        report.outcomes = self
            .run_workers(&locator, files, dedup, destination, &stats, cancel)
            .await?;
        report.statistics = stats.snapshot();

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        if !report.is_success() {
            for outcome in report.failed() {
                warn!(
                    path = %outcome.item.path,
                    error = outcome.error.as_deref().unwrap_or("unknown"),
                    "file download failed"
                );
            }
            return Err(FetchError::DownloadsFailed {
                report: Box::new(report),
            });
        }

        if self.options.check_integrity {
            let include = self.options.include_artifact_name_in_path;
            verify_integrity(report.succeeded().map(|outcome| &outcome.item), |item| {
                resolve_target_path(destination, &item.path, locator.artifact_name(), include)
            })
            .await?;
        }

        info!(
            artifact = locator.artifact_name(),
            files = report.statistics.files_downloaded(),
            bytes = report.statistics.bytes_written,
            "artifact download finished"
        );
        Ok(report)
    }

    /// Create the destination and every folder item, all at once.
    async fn create_folders(
        &self,
        locator: &ResourceLocator,
        folders: &[&RemoteItem],
        create_root: bool,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let include = self.options.include_artifact_name_in_path;
        let mut paths = Vec::with_capacity(folders.len() + 1);
        if create_root {
            paths.push(destination.to_path_buf());
        }
        for folder in folders {
            paths.push(resolve_target_path(
                destination,
                &folder.path,
                locator.artifact_name(),
                include,
            )?);
        }

        let mut tasks = JoinSet::new();
        for path in paths {
            tasks.spawn_blocking(move || artifetch_fs::ensure_dir(path));
        }

        let mut created = 0;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(FetchError::Cancelled);
                }
                next = tasks.join_next() => next,
            };
            match next {
                None => break,
                Some(Ok(Ok(()))) => created += 1,
                Some(Ok(Err(e))) => return Err(e.into()),
                Some(Err(e)) => return Err(FetchError::Worker(e.to_string())),
            }
        }

        debug!(count = created, "created folders");
        Ok(created)
    }

    /// Decide once, before any worker starts, whether the dedup store is used.
    async fn connect_dedup(
        &self,
        files: &[&RemoteItem],
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<F::Client>>> {
        let Some(factory) = &self.dedup else {
            return Ok(None);
        };
        if !self.options.dedup_enabled {
            debug!("dedup store disabled; streaming all files");
            return Ok(None);
        }
        if !files.iter().any(|file| file.blob.is_some()) {
            debug!("no file carries blob metadata; streaming all files");
            return Ok(None);
        }

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            connected = factory.connect(cancel) => connected,
        };

        match connected {
            Ok(client) => {
                info!(host = factory.host(), "downloading through the dedup store");
                Ok(Some(Arc::new(client)))
            }
            Err(TransportError::Cancelled) => Err(FetchError::Cancelled),
            Err(error) => {
                let warning = dedup_fallback_warning(factory.host(), &error);
                warn!("{warning}");
                warnings.push(warning);
                Ok(None)
            }
        }
    }

    async fn run_workers(
        &self,
        locator: &ResourceLocator,
        files: Vec<RemoteItem>,
        dedup: Option<Arc<F::Client>>,
        destination: &Path,
        stats: &Arc<DownloadStatistics>,
        cancel: &CancellationToken,
    ) -> Result<Vec<DownloadOutcome>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let worker = Arc::new(Worker {
            container: Arc::clone(&self.container),
            dedup,
            container_id: locator.container_id(),
            artifact_name: locator.artifact_name().to_owned(),
            destination: destination.to_path_buf(),
            options: self.options.clone(),
            stats: Arc::clone(stats),
            cancel: cancel.clone(),
        });

        let (tx, rx) = mpsc::channel(self.options.queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut pool = JoinSet::new();
        for id in 0..self.options.workers().min(files.len()) {
            let worker = Arc::clone(&worker);
            let queue = Arc::clone(&rx);
            pool.spawn(worker.run(id, queue));
        }
        // Only workers hold the receiver now; if they all stop, sends fail
        // instead of blocking on a full queue.
        drop(rx);

        for item in files {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                sent = tx.send(item) => if sent.is_err() { break },
            }
        }
        drop(tx);

        let mut outcomes = Vec::new();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(mut batch) => outcomes.append(&mut batch),
                Err(e) => return Err(FetchError::Worker(e.to_string())),
            }
        }
        Ok(outcomes)
    }
}

/// State shared by the pool's workers for one call.
struct Worker<C, D> {
    container:     Arc<C>,
    dedup:         Option<Arc<D>>,
    container_id:  i64,
    artifact_name: String,
    destination:   PathBuf,
    options:       DownloadOptions,
    stats:         Arc<DownloadStatistics>,
    cancel:        CancellationToken,
}

impl<C, D> Worker<C, D>
where
    C: ContainerClient + 'static,
    D: DedupStoreClient + 'static,
{
    async fn run(
        self: Arc<Self>,
        id: usize,
        queue: Arc<Mutex<mpsc::Receiver<RemoteItem>>>,
    ) -> Vec<DownloadOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let next = {
                let mut queue = queue.lock().await;
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => None,
                    item = queue.recv() => item,
                }
            };
            let Some(item) = next else {
                break;
            };

            let outcome = match AssertUnwindSafe(self.download(&item)).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.stats.record_failure();
                    DownloadOutcome {
                        transport: self.transport_for(&item),
                        item,
                        target: None,
                        succeeded: false,
                        attempts: 0,
                        error: Some("download task panicked".to_owned()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        debug!(worker = id, completed = outcomes.len(), "download worker finished");
        outcomes
    }

    fn transport_for(&self, item: &RemoteItem) -> Transport {
        if item.blob.is_some() && self.dedup.is_some() {
            Transport::DedupStore
        } else {
            Transport::Stream
        }
    }

    fn retry_policy(&self, max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries).backoff(self.options.backoff)
    }

    async fn download(&self, item: &RemoteItem) -> DownloadOutcome {
        let transport = self.transport_for(item);
        let mut outcome = DownloadOutcome {
            item: item.clone(),
            target: None,
            transport,
            succeeded: false,
            attempts: 0,
            error: None,
        };

        let target = match resolve_target_path(
            &self.destination,
            &item.path,
            &self.artifact_name,
            self.options.include_artifact_name_in_path,
        ) {
            Ok(target) => target,
            Err(e) => return self.fail(outcome, &e),
        };
        outcome.target = Some(target.clone());

        if let Some(parent) = target.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return self.fail(outcome, &FetchError::io(parent, e));
            }
        }

        debug!(path = %item.path, ?transport, "downloading file");

        let mut attempts = 0;
        let result = RetryExecutor::with_policy(self.retry_policy(self.options.retry_count))
            .invoke(
                |attempt| {
                    attempts = attempt + 1;
                    if attempt > 0 {
                        self.stats.record_retry();
                    }
                    self.fetch(item, &target, transport)
                },
                FetchError::is_local_io,
                &self.cancel,
            )
            .await;
        outcome.attempts = attempts;

        match result {
            Ok(bytes) => {
                self.stats.record_file(transport, bytes);
                outcome.succeeded = true;
                debug!(path = %item.path, bytes, "file downloaded");
                outcome
            }
            Err(e) => self.fail(outcome, &e),
        }
    }

    fn fail(&self, mut outcome: DownloadOutcome, error: &FetchError) -> DownloadOutcome {
        if !error.is_cancelled() {
            self.stats.record_failure();
        }
        outcome.error = Some(error_chain(error));
        outcome
    }

    async fn fetch(&self, item: &RemoteItem, target: &Path, transport: Transport) -> Result<u64> {
        match transport {
            Transport::DedupStore => self.fetch_from_dedup(item, target).await,
            Transport::Stream => self.fetch_from_stream(item, target).await,
        }
    }

    async fn fetch_from_dedup(&self, item: &RemoteItem, target: &Path) -> Result<u64> {
        let (Some(dedup), Some(blob)) = (&self.dedup, &item.blob) else {
            return self.fetch_from_stream(item, target).await;
        };
        let transport_error = |source| FetchError::Transport {
            path: item.path.clone(),
            source,
        };

        RetryExecutor::with_policy(self.retry_policy(DEDUP_MAX_RETRIES))
            .invoke(
                |_| async {
                    match blob.compression {
                        Compression::Gzip => {
                            let stream = dedup
                                .download_to_stream(&blob.content_id, &self.cancel)
                                .await
                                .map_err(transport_error)?;
                            write_gzip_stream(stream, target).await
                        }
                        Compression::None => {
                            dedup
                                .download_to_file(&blob.content_id, target, &self.cancel)
                                .await
                                .map_err(transport_error)?;
                            Ok(artifetch_fs::file_len(target)?)
                        }
                    }
                },
                |_| true,
                &self.cancel,
            )
            .await
    }

    async fn fetch_from_stream(&self, item: &RemoteItem, target: &Path) -> Result<u64> {
        let stream = RetryExecutor::with_policy(self.retry_policy(self.options.retry_count))
            .invoke(
                |_| {
                    self.container
                        .open_read_stream(self.container_id, &item.path, &self.cancel)
                },
                TransportError::is_transient,
                &self.cancel,
            )
            .await
            .map_err(|source| FetchError::Transport {
                path: item.path.clone(),
                source,
            })?;

        write_stream(stream, target).await
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
