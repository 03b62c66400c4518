//! In-memory transports for tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils`
//! feature, for downstream crates.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use futures_util::stream;
use tokio_util::sync::CancellationToken;

use crate::data::{BlobReference, ContentId, RemoteItem};
use crate::effects::transport::{ByteStream, ContainerClient, DedupClientFactory, DedupStoreClient};
use crate::error::TransportError;

const CHUNK: usize = 7;

fn chunked(data: Bytes) -> ByteStream {
    let chunks: Vec<Result<Bytes, TransportError>> = (0..data.len())
        .step_by(CHUNK)
        .map(|start| Ok(data.slice(start..(start + CHUNK).min(data.len()))))
        .collect();
    Box::pin(stream::iter(chunks))
}

/// Gzip `data` the way the dedup store keeps compressed blobs.
pub fn gzip(data: &[u8]) -> Bytes {
    let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
    // Writing into a Vec cannot fail.
    let _ = encoder.write_all(data);
    Bytes::from(encoder.finish().unwrap_or_default())
}

/// A container held in memory.
///
/// Paths registered with [`fail_times`](Self::fail_times) answer with a
/// transient error that many times before serving their content.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    items:    Vec<RemoteItem>,
    contents: HashMap<String, Bytes>,
    failures: Mutex<HashMap<String, u32>>,
    opens:    AtomicUsize,
}

impl MemoryContainer {
    pub fn new() -> Self { Self::default() }

    /// Add a file whose listed length matches its content.
    pub fn with_file(self, path: &str, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let item = RemoteItem::file(path, content.len() as u64);
        self.with_item(item, content)
    }

    /// Add an arbitrary item; the listed length is taken as given.
    pub fn with_item(mut self, item: RemoteItem, content: impl Into<Bytes>) -> Self {
        self.contents.insert(item.path.clone(), content.into());
        self.items.push(item);
        self
    }

    pub fn with_folder(mut self, path: &str) -> Self {
        self.items.push(RemoteItem::folder(path));
        self
    }

    pub fn fail_times(self, path: &str, times: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(path.to_owned(), times);
        }
        self
    }

    /// Number of `open_read_stream` calls served so far.
    pub fn open_count(&self) -> usize { self.opens.load(Ordering::SeqCst) }

    pub fn items(&self) -> &[RemoteItem] { &self.items }

    fn take_failure(&self, path: &str) -> bool {
        let Ok(mut failures) = self.failures.lock() else {
            return false;
        };
        match failures.get_mut(path) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl ContainerClient for MemoryContainer {
    async fn list_items(
        &self,
        _container_id: i64,
        root: &str,
        include_blob_metadata: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteItem>, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        Ok(self
            .items
            .iter()
            .filter(|item| item.path == root || item.path.starts_with(&format!("{root}/")))
            .map(|item| {
                let mut item = item.clone();
                if !include_blob_metadata {
                    item.blob = None;
                }
                item
            })
            .collect())
    }

    async fn open_read_stream(
        &self,
        _container_id: i64,
        item_path: &str,
        cancel: &CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.take_failure(item_path) {
            return Err(TransportError::Transient(format!("connection reset reading {item_path}")));
        }
        match self.contents.get(item_path) {
            Some(content) => Ok(chunked(content.clone())),
            None => Err(TransportError::NotFound(item_path.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reachability {
    Reachable,
    Unreachable,
    Rejecting,
}

/// A dedup store held in memory, handed out through [`DedupClientFactory`].
/// Clones share blobs and the download counter.
#[derive(Debug, Clone)]
pub struct MemoryDedupStore {
    host:      String,
    blobs:     Arc<HashMap<ContentId, Bytes>>,
    reachable: Reachability,
    downloads: Arc<AtomicUsize>,
}

impl Default for MemoryDedupStore {
    fn default() -> Self { Self::new() }
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self {
            host:      "dedup.memory.test".to_owned(),
            blobs:     Default::default(),
            reachable: Reachability::Reachable,
            downloads: Default::default(),
        }
    }

    /// Store `content` under `id` exactly as given (compressed or not).
    pub fn with_blob(mut self, id: &str, content: impl Into<Bytes>) -> Self {
        Arc::make_mut(&mut self.blobs).insert(ContentId::new(id), content.into());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    /// Connecting fails at the socket level.
    pub fn unreachable(mut self) -> Self {
        self.reachable = Reachability::Unreachable;
        self
    }

    /// Connecting fails with an authorization rejection.
    pub fn rejecting(mut self) -> Self {
        self.reachable = Reachability::Rejecting;
        self
    }

    /// Blob downloads served by every client of this store.
    pub fn download_count(&self) -> usize { self.downloads.load(Ordering::SeqCst) }

    /// Reference to a stored blob, for building listings.
    pub fn reference(id: &str) -> BlobReference { BlobReference::new(id) }
}

impl DedupClientFactory for MemoryDedupStore {
    type Client = MemoryDedupClient;

    fn host(&self) -> &str { &self.host }

    async fn connect(
        &self,
        cancel: &CancellationToken,
    ) -> Result<MemoryDedupClient, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        match self.reachable {
            Reachability::Reachable => Ok(MemoryDedupClient {
                blobs:     Arc::clone(&self.blobs),
                downloads: Arc::clone(&self.downloads),
            }),
            Reachability::Unreachable => Err(TransportError::Unreachable {
                endpoint: self.host.clone(),
                message:  "connection refused".to_owned(),
            }),
            Reachability::Rejecting => Err(TransportError::Rejected {
                status:  401,
                message: "token is not authorized for the dedup store".to_owned(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct MemoryDedupClient {
    blobs:     Arc<HashMap<ContentId, Bytes>>,
    downloads: Arc<AtomicUsize>,
}

impl MemoryDedupClient {
    fn blob(&self, id: &ContentId) -> Result<Bytes, TransportError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.blobs
            .get(id)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(id.to_string()))
    }
}

impl DedupStoreClient for MemoryDedupClient {
    async fn download_to_file(
        &self,
        id: &ContentId,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        let content = self.blob(id)?;
        tokio::fs::write(destination, &content).await?;
        Ok(())
    }

    async fn download_to_stream(
        &self,
        id: &ContentId,
        cancel: &CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        Ok(chunked(self.blob(id)?))
    }
}
