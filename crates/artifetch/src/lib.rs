//! Filtered, parallel download of build artifacts.
//!
//! [`ArtifactProvider`] ties the workspace crates together:
//!
//! 1. list the artifact's container items (`artifetch-fetch`)
//! 2. keep the items selected by the ordered pattern list (`artifetch-pattern`)
//! 3. download them through the dedup store or the streaming endpoint
//!    (`artifetch-fetch`)
//! 4. optionally unpack downloaded `.tar` files into `extracted_tars`
//!    (`artifetch-archive`)
//!
//! Configuration comes from [`DownloadParameters`], typically loaded from TOML.

mod artifact;
mod config;
mod error;
mod provider;
pub mod telemetry;

pub use artifact::BuildArtifact;
pub use config::DownloadParameters;
pub use error::{Error, Result};
pub use provider::{ArtifactDownload, ArtifactProvider};

pub use artifetch_archive::{TarBackend, TarReport};
pub use artifetch_fetch::{
    CancellationToken, ContainerClient, DedupClientFactory, DedupStoreClient, DownloadReport,
    FetchError, RemoteItem, StatisticsSnapshot, TransportError,
};
#[cfg(feature = "reqwest")]
pub use artifetch_fetch::ReqwestContainerClient;
pub use artifetch_pattern::MatchOptions;
