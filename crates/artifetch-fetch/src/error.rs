//! Error types for artifetch-fetch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::data::DownloadReport;

/// Failure reported by a transport client.
///
/// The variant decides retry eligibility: [`TransportError::is_transient`]
/// errors are retried, everything else surfaces immediately.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{endpoint} is unreachable: {message}")]
    Unreachable { endpoint: String, message: String },

    #[error("transient transport failure: {0}")]
    Transient(String),

    #[error("{0} was not found")]
    NotFound(String),

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Transient(_) | Self::Io(_))
    }

    /// Socket-level failure to reach an endpoint at all.
    pub fn is_unreachable(&self) -> bool { matches!(self, Self::Unreachable { .. }) }
}

impl From<TransportError> for io::Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Io(e) => e,
            other => io::Error::other(other),
        }
    }
}

/// A downloaded file whose size on disk differs from the remote record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptedItem {
    pub path:     String,
    pub local:    PathBuf,
    pub expected: u64,
    /// `None` when the file is missing altogether
    pub actual:   Option<u64>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource data value '{0}' is invalid")]
    InvalidLocator(String),

    #[error("item path {path} cannot be shorter than artifact name {artifact}")]
    PathShorterThanArtifact { path: String, artifact: String },

    #[error("item path {0} escapes the download root")]
    UnsafeItemPath(String),

    #[error("I/O error on {path}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] artifetch_fs::Error),

    #[error("transport error for {path}")]
    Transport {
        path:   String,
        #[source]
        source: TransportError,
    },

    #[error(
        "{} of {} downloads failed: {}",
        .report.failed().count(),
        .report.outcomes.len(),
        failed_paths(.report)
    )]
    DownloadsFailed { report: Box<DownloadReport> },

    #[error("integrity check failed for {}", corrupted_paths(.items))]
    IntegrityCheckFailed { items: Vec<CorruptedItem> },

    #[error("download worker stopped unexpectedly: {0}")]
    Worker(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Local I/O failures are worth another attempt; everything else already
    /// went through the transport's own retry bound.
    pub fn is_local_io(&self) -> bool { matches!(self, Self::Io { .. } | Self::Fs(_)) }
}

fn failed_paths(report: &DownloadReport) -> String {
    report
        .failed()
        .map(|outcome| outcome.item.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn corrupted_paths(items: &[CorruptedItem]) -> String {
    items
        .iter()
        .map(|item| match item.actual {
            Some(actual) => {
                format!("{} (expected {} bytes, found {actual})", item.path, item.expected)
            }
            None => format!("{} (expected {} bytes, file missing)", item.path, item.expected),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(TransportError::Transient("reset".into()).is_transient());
        assert!(
            TransportError::Unreachable {
                endpoint: "blob.example".into(),
                message:  "refused".into(),
            }
            .is_unreachable()
        );
        assert!(!TransportError::NotFound("x".into()).is_transient());
        assert!(!TransportError::Cancelled.is_transient());
    }

    #[test]
    fn test_integrity_message_lists_every_item() {
        let err = FetchError::IntegrityCheckFailed {
            items: vec![
                CorruptedItem {
                    path:     "a/one.bin".into(),
                    local:    PathBuf::from("/tmp/one.bin"),
                    expected: 10,
                    actual:   Some(4),
                },
                CorruptedItem {
                    path:     "a/two.bin".into(),
                    local:    PathBuf::from("/tmp/two.bin"),
                    expected: 3,
                    actual:   None,
                },
            ],
        };
        let message = err.to_string();
        assert!(message.contains("a/one.bin (expected 10 bytes, found 4)"));
        assert!(message.contains("a/two.bin (expected 3 bytes, file missing)"));
    }
}
