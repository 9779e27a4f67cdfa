//! Retry with exponential backoff for calls to the log service.
//!
//! Both remote operations are safe to repeat: listing is read-only, and
//! setting the same retention twice leaves the same end state.

use std::future::Future;

use tracing::{debug, warn};

use crate::config::RetryConfig;

/// Execute an async operation with retry logic.
///
/// `is_retryable` decides whether an error is worth another attempt. The
/// last error is returned once attempts are exhausted, or immediately for a
/// non-retryable error.
pub async fn with_retry_generic<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    is_retryable: P,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    if !config.is_enabled() {
        return operation().await;
    }

    let max_attempts = config.max_retries + 1; // +1 for initial attempt
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) => {
                if is_retryable(&error) && attempt + 1 < max_attempts {
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        operation = operation_name,
                        error = %error,
                        attempt = attempt + 1,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis(),
                        "Retryable error, will retry after delay"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                if attempt > 0 {
                    warn!(
                        operation = operation_name,
                        error = %error,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts"
                    );
                }

                return Err(error);
            }
        }
    }
}
