//! Immutable data types for artifact downloads.
//!
//! Items come from a remote listing and are never mutated during a download
//! pass; options are built once per call; reports and statistics describe
//! what a call did.

pub mod item;
pub mod locator;
pub mod options;
pub mod report;
pub mod stats;

pub use item::{BlobReference, Compression, ContentId, ItemKind, RemoteItem};
pub use locator::ResourceLocator;
pub use options::{
    DEFAULT_PARALLELISM, DEFAULT_QUEUE_CAPACITY, DEFAULT_RETRY_COUNT, DownloadOptions,
};
pub use report::{DownloadOutcome, DownloadReport, Transport};
pub use stats::{DownloadStatistics, StatisticsSnapshot};
