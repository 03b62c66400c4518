use std::fmt::Display;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::RetryPolicy;
use crate::error::{FetchError, TransportError};

/// Errors the [`RetryExecutor`] can produce on cancellation and recognise
/// as such.
pub trait Retryable: Display {
    fn cancelled() -> Self;

    fn is_cancelled(&self) -> bool;
}

impl Retryable for FetchError {
    fn cancelled() -> Self { FetchError::Cancelled }

    fn is_cancelled(&self) -> bool {
        matches!(
            self,
            FetchError::Cancelled
                | FetchError::Transport {
                    source: TransportError::Cancelled,
                    ..
                }
        )
    }
}

impl Retryable for TransportError {
    fn cancelled() -> Self { TransportError::Cancelled }

    fn is_cancelled(&self) -> bool { matches!(self, TransportError::Cancelled) }
}

/// Runs an async operation with bounded retries.
///
/// Every attempt races the cancellation token, so a fired token aborts the
/// sequence mid-attempt instead of after the retries run out. Cancellation
/// is never retried, whatever the predicate says.
#[derive(Debug, Clone, Copy)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(max_retries: u32) -> Self {
        Self {
            policy: RetryPolicy::new(max_retries),
        }
    }

    pub fn with_policy(policy: RetryPolicy) -> Self { Self { policy } }

    pub fn policy(&self) -> RetryPolicy { self.policy }

    /// Invoke `operation` until it succeeds, fails with an error
    /// `is_retryable` rejects, runs out of retries, or `cancel` fires.
    ///
    /// The operation receives the zero-based attempt number.
    pub async fn invoke<T, E, Op, Fut, P>(
        &self,
        mut operation: Op,
        is_retryable: P,
        cancel: &CancellationToken,
    ) -> Result<T, E>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Retryable,
    {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(E::cancelled());
            }

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(E::cancelled()),
                result = operation(attempt) => result,
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if error.is_cancelled()
                || attempt >= self.policy.max_retries
                || !is_retryable(&error)
            {
                return Err(error);
            }

            warn!(
                attempt = attempt + 1,
                max_retries = self.policy.max_retries,
                error = %error,
                "operation failed; retrying"
            );

            if let Some(delay) = self.policy.delay(attempt) {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(E::cancelled()),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn transient() -> TransportError { TransportError::Transient("flaky".into()) }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(3);

        let result = executor
            .invoke(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { if attempt < 2 { Err(transient()) } else { Ok(attempt) } }
                },
                TransportError::is_transient,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(2);

        let result: Result<(), _> = executor
            .invoke(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(TransportError::Transient(format!("attempt {attempt}"))) }
                },
                |_| true,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(result.unwrap_err().to_string(), "transient transport failure: attempt 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(5);

        let result: Result<(), _> = executor
            .invoke(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TransportError::NotFound("gone".into())) }
                },
                TransportError::is_transient,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(TransportError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_is_never_retried() {
        let calls = AtomicU32::new(0);
        let executor = RetryExecutor::new(5);

        let result: Result<(), _> = executor
            .invoke(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TransportError::Cancelled) }
                },
                |_| true,
                &CancellationToken::new(),
            )
            .await;

        assert!(matches!(result, Err(TransportError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_attempt() {
        let cancel = CancellationToken::new();
        let executor = RetryExecutor::new(10);
        let calls = Arc::new(AtomicU32::new(0));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let counter = Arc::clone(&calls);
        let result: Result<(), FetchError> = executor
            .invoke(
                |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(())
                    }
                },
                |_| true,
                &cancel,
            )
            .await;

        assert!(matches!(result, Err(FetchError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_between_attempts() {
        let policy = RetryPolicy::new(2).backoff(Some(Duration::from_secs(1)));
        let executor = RetryExecutor::with_policy(policy);
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = executor
            .invoke(|_| async { Err(transient()) }, |_| true, &CancellationToken::new())
            .await;

        assert!(result.is_err());
        // 1s before the first retry, 2s before the second.
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
