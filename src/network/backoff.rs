//! Shared backoff policy for retried network work
//!
//! One policy object serves both the scheduler's cool-down and the execution
//! engine's reverse-leg retries; attempt counts are the only per-site knob.

use std::time::Duration;
use tracing::warn;
use crate::errors::{BotError, BotResult};

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based), exponentially grown,
    /// capped, with up to 10% jitter to avoid thundering retries.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let mut delay =
            (self.initial_delay_ms as f64 * self.exponential_base.powi(exponent as i32)) as u64;
        delay = delay.min(self.max_delay_ms);
        let jitter = (delay as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as i64;
        Duration::from_millis(delay.saturating_add_signed(jitter))
    }
}

/// Retries `operation` under `policy`. Rate-limit errors are NOT retried
/// here: they propagate immediately so the request scheduler, which owns the
/// rate accounting, can absorb them.
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    policy: &BackoffPolicy,
    context: &str,
) -> BotResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = BotResult<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_rate_limited() => return Err(e),
            Err(e) if attempt >= policy.max_attempts => {
                return Err(BotError::Network {
                    message: format!("{} failed after {} attempts", context, attempt),
                    source: Some(e.into()),
                    retry_count: attempt,
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "Attempt {}/{} failed for {}: {}. Retrying in {:?}...",
                    attempt, policy.max_attempts, context, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
