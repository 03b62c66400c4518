use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::data::{ContentId, RemoteItem};
use crate::error::TransportError;

/// A boxed, sendable stream.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response body of a transport download.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Path-addressed access to a file container.
///
/// # Implementations
///
/// - [`ReqwestContainerClient`](crate::ReqwestContainerClient): HTTP implementation
/// - In-memory doubles in [`mock`](crate::effects::mock) for testing
pub trait ContainerClient: Send + Sync {
    /// List every item below `root` in the container.
    ///
    /// With `include_blob_metadata`, items stored in the dedup store carry a
    /// [`BlobReference`](crate::BlobReference).
    fn list_items(
        &self,
        container_id: i64,
        root: &str,
        include_blob_metadata: bool,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<RemoteItem>, TransportError>> + Send;

    /// Open the content of one file item as a byte stream.
    fn open_read_stream(
        &self,
        container_id: i64,
        item_path: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send;
}

/// Content-addressed download from the dedup store.
pub trait DedupStoreClient: Send + Sync {
    /// Write the content of `id` to `destination`, replacing any existing file.
    fn download_to_file(
        &self,
        id: &ContentId,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Stream the raw (possibly compressed) content of `id`.
    fn download_to_stream(
        &self,
        id: &ContentId,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send;
}

/// Builds a [`DedupStoreClient`] for one download call.
///
/// Construction may fail (the store may be unreachable from this machine);
/// the orchestrator then falls back to streaming for the whole call.
pub trait DedupClientFactory: Send + Sync {
    type Client: DedupStoreClient + 'static;

    /// Host name shown in the fallback warning.
    fn host(&self) -> &str;

    fn connect(
        &self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Self::Client, TransportError>> + Send;
}

/// Placeholder factory for orchestrators that only stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDedupStore;

impl DedupStoreClient for NoDedupStore {
    async fn download_to_file(
        &self,
        id: &ContentId,
        _destination: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        Err(TransportError::NotFound(id.to_string()))
    }

    async fn download_to_stream(
        &self,
        id: &ContentId,
        _cancel: &CancellationToken,
    ) -> Result<ByteStream, TransportError> {
        Err(TransportError::NotFound(id.to_string()))
    }
}

impl DedupClientFactory for NoDedupStore {
    type Client = NoDedupStore;

    fn host(&self) -> &str { "" }

    async fn connect(&self, _cancel: &CancellationToken) -> Result<Self::Client, TransportError> {
        Err(TransportError::Rejected {
            status:  0,
            message: "no dedup store configured".to_owned(),
        })
    }
}
