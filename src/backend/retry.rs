//! Exponential backoff with jitter for idempotent remote reads.

use log::warn;
use std::future::Future;
use std::time::Duration;

use super::BackendError;
use crate::config::RetryConfig;

/// Backoff delay before retry number `attempt` (zero-based).
///
/// Formula: `min(max_delay, base_delay * 2^attempt) * (1 + (2r - 1) * jitter)`
/// where `r` is in `[0, 1)`, so a jitter of 0.2 varies the delay by ±20%.
pub fn backoff_delay(attempt: u32, config: &RetryConfig, random: f64) -> Duration {
    let exponential = config.base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(config.max_delay_ms) as f64;
    let spread = (2.0 * random.clamp(0.0, 1.0) - 1.0) * config.jitter;
    Duration::from_millis((capped * (1.0 + spread)).max(0.0).round() as u64)
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is exhausted.
pub async fn with_retry<T, F, Fut>(label: &str, config: &RetryConfig, mut operation: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = backoff_delay(attempt, config, rand::random::<f64>());
                warn!(
                    "🔁 {} failed (attempt {}/{}): {}. Retrying in {:?}",
                    label,
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
