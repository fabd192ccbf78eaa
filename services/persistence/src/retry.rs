//! Bounded-backoff retry for idempotent storage operations
//!
//! Only storage-kind failures are retried; validation, not-found, and
//! state-conflict results pass straight through so callers see them on the
//! first attempt.

use std::future::Future;
use std::time::Duration;

use types::EngineError;

/// Run `operation` up to `attempts` times, doubling the delay between
/// tries. Returns the first non-storage error immediately.
pub async fn with_backoff<T, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EngineError>>,
{
    assert!(attempts > 0, "at least one attempt required");
    let mut delay = base_delay;
    let mut last_error = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(EngineError::Storage(message)) => {
                tracing::warn!(attempt, attempts, error = %message, "storage operation failed");
                last_error = Some(EngineError::Storage(message));
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(last_error.expect("loop ran at least once"))
}
