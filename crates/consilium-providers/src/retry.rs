//! Exponential backoff for throttled upstream calls.

use crate::error::ProviderError;
use log::warn;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule applied when an upstream signals throttling.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Run a call, retrying only on `RateLimited` until attempts are exhausted.
///
/// All other failure kinds are terminal and returned unchanged. Exhaustion
/// surfaces `RateLimited` so callers can distinguish throttling from other
/// upstream failures.
pub async fn retry_throttled<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;
    loop {
        match call().await {
            Err(ProviderError::RateLimited) if attempt < policy.max_attempts => {
                warn!(
                    "upstream throttled, backing off (provider={}, attempt={}, delay_ms={})",
                    provider,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}
