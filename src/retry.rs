// SPDX-License-Identifier: MIT
//! Exponential backoff retry for the provider call.
//!
//! Only the synthesis call goes through here — re-sending an identical
//! directive is idempotent. Parse, validation, and filesystem failures are
//! never retried.

use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for [`retry_with_backoff`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first try.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled (capped) after each failure.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Default backoff with a caller-chosen attempt budget (minimum 1).
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Config suitable for unit tests — no real waiting.
    pub fn instant() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
        }
    }
}

/// Call `f` up to `config.max_attempts` times, sleeping between failures.
///
/// Returns the first success, or the last error once attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let max_attempts = config.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match f().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "retry succeeded");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                warn!(
                    attempt,
                    max = max_attempts,
                    delay_ms = delay.as_millis(),
                    err = %e,
                    "attempt failed — retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(config.max_delay);
            }
            Err(e) => {
                warn!(attempt, max = max_attempts, err = %e, "all attempts exhausted");
                return Err(e);
            }
        }
    }
    unreachable!("the attempt loop always runs at least once")
}
