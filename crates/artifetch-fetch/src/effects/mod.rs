//! I/O operations for artifact downloads.
//!
//! Transports sit behind traits so the orchestrator can be driven by the
//! HTTP implementation in production and by in-memory doubles in tests.

mod integrity;
mod orchestrator;
mod retry;
mod transport;
mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(feature = "reqwest")]
mod http;

pub use integrity::verify_integrity;
pub use orchestrator::DownloadOrchestrator;
pub use retry::{RetryExecutor, Retryable};
pub use transport::{
    BoxStream, ByteStream, ContainerClient, DedupClientFactory, DedupStoreClient, NoDedupStore,
};

#[cfg(feature = "reqwest")]
pub use http::ReqwestContainerClient;
