//! Bounded retry with exponential backoff for external calls.

use crate::error::CollaboratorError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound of a single backoff sleep.
pub const MAX_BACKOFF_MS: u64 = 2_000;

/// Retry and timeout budget of one external operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retries: u32,
    /// Initial backoff, doubled after every failed attempt.
    pub backoff_ms: u64,
    /// Deadline of each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_ms: 250,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Worst-case wall time of [`with_retry`]: every attempt runs into its
    /// deadline and every backoff is slept in full.
    ///
    /// An outer deadline around a retried call must be at least this long,
    /// otherwise it fires before the first retry starts.
    pub fn total_budget(&self) -> Duration {
        let mut total = self.timeout.saturating_mul(self.retries.saturating_add(1));
        let mut backoff_ms = self.backoff_ms.max(1);
        for _ in 0..self.retries {
            total = total.saturating_add(Duration::from_millis(backoff_ms.min(MAX_BACKOFF_MS)));
            backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
        }
        total
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
///
/// Every attempt is bounded by `policy.timeout`; an elapsed deadline counts
/// as a retryable [`CollaboratorError::Timeout`].
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, CollaboratorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let mut attempt = 0u32;
    let mut backoff_ms = policy.backoff_ms.max(1);

    loop {
        attempt += 1;

        if attempt > 1 {
            debug!(operation = operation_name, attempt, "Retrying external call");
        }

        let result = match tokio::time::timeout(policy.timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(policy.timeout.as_secs())),
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || attempt > policy.retries {
            return Err(err);
        }

        let sleep_ms = backoff_ms.min(MAX_BACKOFF_MS);
        warn!(
            operation = operation_name,
            attempt,
            backoff_ms = sleep_ms,
            error = %err,
            "External call failed, will retry after backoff"
        );
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        backoff_ms = backoff_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
    }
}
