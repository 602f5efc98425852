//! Fixed-delay, cancellation-aware retry

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::coordination::ShutdownToken;
use crate::error::{MonitorError, Result};

/// Run `op` up to `max_retries + 1` times.
///
/// Cancellation is checked before every attempt and during every wait; an
/// attempt already in flight is allowed to finish. Non-retryable errors are
/// returned as-is. Exhaustion yields `RetryExhausted` wrapping the last error.
pub async fn retry_do<T, F, Fut>(
    token: &ShutdownToken,
    mut op: F,
    max_retries: u32,
    delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut token = token.clone();
    let mut attempt = 0u32;

    loop {
        if token.is_cancelled() {
            return Err(MonitorError::Cancelled);
        }

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt == max_retries {
            return Err(MonitorError::RetryExhausted {
                retries: max_retries,
                source: Box::new(err),
            });
        }
        attempt += 1;

        warn!(
            retry_count = attempt,
            max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "operation failed, retrying"
        );

        tokio::select! {
            _ = token.cancelled() => return Err(MonitorError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
