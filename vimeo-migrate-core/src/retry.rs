//! Retry with exponential backoff for remote calls.
//!
//! Only transient failures are retried: timeouts, connection errors, HTTP 429 and 5xx.
//! The delay doubles (by `backoff_multiplier`) after each attempt, capped at `max_delay`,
//! with optional jitter of up to 100% of the current delay.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::ApiError;

/// Classifies an error as worth another attempt.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            ApiError::Decode { .. }
            | ApiError::InvalidUrl(_)
            | ApiError::MissingField(_)
            | ApiError::IncompleteTransfer { .. } => false,
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or `config.max_attempts` retries
/// are used up. Returns the last error in the latter two cases.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay();

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;
                let wait = if config.jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    operation = operation_name,
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = wait.as_millis() as u64,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(wait).await;
                delay = next_delay(delay, config);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(
                        operation = operation_name,
                        error = %e,
                        "Operation failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Falls back to `max_delay` when the scaled delay is not a valid `Duration`
/// (negative, NaN or overflowing multipliers).
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let max_delay = config.max_delay();
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .map_or(max_delay, |next| next.min(max_delay))
}

fn add_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis == 0 {
        return delay;
    }
    let extra = rand::thread_rng().gen_range(0..=millis);
    delay + Duration::from_millis(extra)
}
