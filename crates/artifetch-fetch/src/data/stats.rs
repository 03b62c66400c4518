use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::data::report::Transport;

/// Counters shared by all workers of one download call.
#[derive(Debug, Default)]
pub struct DownloadStatistics {
    files_via_dedup:  AtomicU64,
    files_via_stream: AtomicU64,
    bytes_written:    AtomicU64,
    failed_files:     AtomicU64,
    retries:          AtomicU64,
    folders_created:  AtomicU64,
}

impl DownloadStatistics {
    pub fn new() -> Self { Self::default() }

    pub fn record_file(&self, transport: Transport, bytes: u64) {
        let counter = match transport {
            Transport::DedupStore => &self.files_via_dedup,
            Transport::Stream => &self.files_via_stream,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self) { self.failed_files.fetch_add(1, Ordering::Relaxed); }

    pub fn record_retry(&self) { self.retries.fetch_add(1, Ordering::Relaxed); }

    pub fn record_folders(&self, count: u64) {
        self.folders_created.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            files_via_dedup:  self.files_via_dedup.load(Ordering::Relaxed),
            files_via_stream: self.files_via_stream.load(Ordering::Relaxed),
            bytes_written:    self.bytes_written.load(Ordering::Relaxed),
            failed_files:     self.failed_files.load(Ordering::Relaxed),
            retries:          self.retries.load(Ordering::Relaxed),
            folders_created:  self.folders_created.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DownloadStatistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    pub files_via_dedup:  u64,
    pub files_via_stream: u64,
    pub bytes_written:    u64,
    pub failed_files:     u64,
    pub retries:          u64,
    pub folders_created:  u64,
}

impl StatisticsSnapshot {
    pub fn files_downloaded(&self) -> u64 { self.files_via_dedup + self.files_via_stream }

    /// Fold another call's numbers into this one.
    pub fn merge(&mut self, other: &Self) {
        self.files_via_dedup += other.files_via_dedup;
        self.files_via_stream += other.files_via_stream;
        self.bytes_written += other.bytes_written;
        self.failed_files += other.failed_files;
        self.retries += other.retries;
        self.folders_created += other.folders_created;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = DownloadStatistics::new();
        stats.record_file(Transport::DedupStore, 10);
        stats.record_file(Transport::Stream, 5);
        stats.record_file(Transport::Stream, 1);
        stats.record_failure();
        stats.record_retry();
        stats.record_folders(3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.files_via_dedup, 1);
        assert_eq!(snapshot.files_via_stream, 2);
        assert_eq!(snapshot.files_downloaded(), 3);
        assert_eq!(snapshot.bytes_written, 16);
        assert_eq!(snapshot.failed_files, 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.folders_created, 3);
    }

    #[test]
    fn test_merge() {
        let mut total = StatisticsSnapshot {
            files_via_stream: 2,
            bytes_written: 100,
            ..Default::default()
        };
        total.merge(&StatisticsSnapshot {
            files_via_dedup: 1,
            bytes_written: 50,
            retries: 4,
            ..Default::default()
        });

        assert_eq!(total.files_downloaded(), 3);
        assert_eq!(total.bytes_written, 150);
        assert_eq!(total.retries, 4);
    }
}
