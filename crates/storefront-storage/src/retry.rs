//! Exponential backoff for transient storage and download failures.

use std::future::Future;
use std::time::Duration;

use crate::error::StorageError;

/// Transient: 429, 5xx, and network-level failures. Everything else (404,
/// other 4xx, empty bodies, bad paths) fails the same way on a second try.
fn is_retriable(err: &StorageError) -> bool {
    match err {
        StorageError::RateLimited { .. } | StorageError::Http(_) => true,
        StorageError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Seconds to wait before retry `attempt + 1`: `base * 2^attempt`, or the
/// server's `Retry-After` when that is longer.
fn backoff_secs(err: &StorageError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        StorageError::RateLimited {
            retry_after_secs, ..
        } => backoff.max(*retry_after_secs),
        _ => backoff,
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` extra
/// times. The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`,
/// stretched to a rate limit's `Retry-After` when that is longer.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_secs(&err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient storage error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
