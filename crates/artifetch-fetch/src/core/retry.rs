use std::time::Duration;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The current retry number (0-indexed: 0 = first retry)
/// * `base` - The base delay duration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use artifetch_fetch::core::retry_delay;
///
/// // First retry: base * 2^0 = base
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
///
/// // Second retry: base * 2^1 = base * 2
/// assert_eq!(retry_delay(1, Duration::from_millis(100)), Duration::from_millis(200));
///
/// // Third retry: base * 2^2 = base * 4
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    // Use saturating_pow to prevent overflow
    let multiplier = 2_u32.saturating_pow(retry_count);

    // Use saturating_mul to prevent Duration overflow
    base.saturating_mul(multiplier)
}

/// Bounds for one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base for [`retry_delay`]; `None` retries immediately
    pub backoff:     Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: None,
        }
    }

    pub fn backoff(mut self, base: Option<Duration>) -> Self {
        self.backoff = base;
        self
    }

    /// Delay before retry number `retry` (0-indexed), if any.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        self.backoff.map(|base| retry_delay(retry, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_basic() {
        let base = Duration::from_millis(100);

        // First retry (retry_count = 0): base * 2^0 = base
        assert_eq!(retry_delay(0, base), Duration::from_millis(100));

        // Second retry (retry_count = 1): base * 2^1 = base * 2
        assert_eq!(retry_delay(1, base), Duration::from_millis(200));

        // Fourth retry (retry_count = 3): base * 2^3 = base * 8
        assert_eq!(retry_delay(3, base), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_delay_zero_base() {
        let base = Duration::from_millis(0);

        // Even with exponential backoff, zero base stays zero
        assert_eq!(retry_delay(0, base), Duration::from_millis(0));
        assert_eq!(retry_delay(10, base), Duration::from_millis(0));
    }

    #[test]
    fn test_retry_delay_overflow_protection() {
        // Use a very large base to test saturating behavior
        let base = Duration::from_secs(u64::MAX / 2);

        let delay = retry_delay(40, base);
        assert_eq!(delay, Duration::MAX);
    }

    #[test]
    fn test_policy_delay() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.delay(0), None);

        let policy = policy.backoff(Some(Duration::from_millis(10)));
        assert_eq!(policy.delay(0), Some(Duration::from_millis(10)));
        assert_eq!(policy.delay(2), Some(Duration::from_millis(40)));
    }
}
