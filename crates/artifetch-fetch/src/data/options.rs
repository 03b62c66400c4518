use std::time::Duration;

/// Default number of concurrent file downloads.
pub const DEFAULT_PARALLELISM: usize = 8;

/// Default retry bound for a file download.
pub const DEFAULT_RETRY_COUNT: u32 = 4;

/// Admission queue in front of the worker pool.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;

/// Configuration for a single download call.
///
/// # Example
///
/// ```
/// use artifetch_fetch::DownloadOptions;
///
/// let options = DownloadOptions::default()
///     .parallelism(16)
///     .retry_count(2)
///     .check_integrity(true);
/// assert_eq!(options.parallelism, 16);
/// ```
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Size of the worker pool; zero is treated as one
    pub parallelism:                   usize,
    /// Retries per file after the first attempt
    pub retry_count:                   u32,
    /// Compare on-disk sizes with the listing after all downloads finish
    pub check_integrity:               bool,
    /// Keep the artifact name as the first directory under the destination
    pub include_artifact_name_in_path: bool,
    /// Allow the dedup-store transport at all
    pub dedup_enabled:                 bool,
    /// Bound of the admission queue feeding the workers
    pub queue_capacity:                usize,
    /// Base delay for exponential backoff between attempts; none by default
    pub backoff:                       Option<Duration>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            parallelism:                   DEFAULT_PARALLELISM,
            retry_count:                   DEFAULT_RETRY_COUNT,
            check_integrity:               false,
            include_artifact_name_in_path: false,
            dedup_enabled:                 true,
            queue_capacity:                DEFAULT_QUEUE_CAPACITY,
            backoff:                       None,
        }
    }
}

impl DownloadOptions {
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn check_integrity(mut self, check: bool) -> Self {
        self.check_integrity = check;
        self
    }

    pub fn include_artifact_name_in_path(mut self, include: bool) -> Self {
        self.include_artifact_name_in_path = include;
        self
    }

    pub fn dedup_enabled(mut self, enabled: bool) -> Self {
        self.dedup_enabled = enabled;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn backoff(mut self, base: Duration) -> Self {
        self.backoff = Some(base);
        self
    }

    pub(crate) fn workers(&self) -> usize { self.parallelism.max(1) }
}
