//! Parallel download of build-artifact items.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable item, option and report types
//! - [`core`] - Pure transformations (path resolution, retry delays, hints)
//! - [`effects`] - I/O behind the [`ContainerClient`] and [`DedupStoreClient`] traits
//!
//! # Key Features
//!
//! - **Bounded Fan-Out**: a fixed worker pool fed by a bounded queue
//! - **Transport Fallback**: dedup store when reachable, streaming otherwise
//! - **Partial-Failure Isolation**: every item runs to completion before the call fails
//! - **Cancellation**: one token threads through folders, workers, retries and transports

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{allow_list_link, resolve_target_path, retry_delay};
pub use data::{
    BlobReference, Compression, ContentId, DEFAULT_PARALLELISM, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_RETRY_COUNT, DownloadOptions, DownloadOutcome, DownloadReport, DownloadStatistics,
    ItemKind, RemoteItem, ResourceLocator, StatisticsSnapshot, Transport,
};
pub use effects::{
    BoxStream, ByteStream, ContainerClient, DedupClientFactory, DedupStoreClient,
    DownloadOrchestrator, NoDedupStore, RetryExecutor, Retryable, verify_integrity,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestContainerClient;

pub use error::{CorruptedItem, FetchError, Result, TransportError};
pub use tokio_util::sync::CancellationToken;
