use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::item::RemoteItem;
use crate::data::stats::StatisticsSnapshot;

/// Transport that carried (or tried to carry) a file's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    DedupStore,
    Stream,
}

/// Result for one file item.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub item:      RemoteItem,
    /// Resolved local path; `None` when it could not be computed
    pub target:    Option<PathBuf>,
    pub transport: Transport,
    pub succeeded: bool,
    /// Attempts made, including the first
    pub attempts:  u32,
    pub error:     Option<String>,
}

/// Everything a download call produced.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    pub artifact_name:   String,
    pub destination:     PathBuf,
    /// One entry per file item, in completion order
    pub outcomes:        Vec<DownloadOutcome>,
    pub folders_created: usize,
    /// Whether the dedup store was in use for this call
    pub dedup_active:    bool,
    /// Caller-visible, non-fatal conditions
    pub warnings:        Vec<String>,
    pub statistics:      StatisticsSnapshot,
}

impl DownloadReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded)
    }

    pub fn is_success(&self) -> bool { self.failed().next().is_none() }

    /// Local paths of every successfully written file.
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.succeeded().filter_map(|outcome| outcome.target.as_deref())
    }

    pub fn outcome(&self, item_path: &str) -> Option<&DownloadOutcome> {
        self.outcomes.iter().find(|outcome| outcome.item.path == item_path)
    }
}
