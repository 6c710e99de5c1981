//! Bounded exponential backoff for dataset fetches.

use anyhow::{anyhow, Result};
use metrics::counter;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    1_000
}
fn default_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let factor = self.multiplier.max(1.0).powi(exp);
        let ms = (self.initial_delay_ms as f64 * factor).min(u64::MAX as f64);
        Duration::from_millis(ms as u64)
    }
}

/// Run `op` until it succeeds or the attempts are exhausted.
/// The last error is returned with the attempt count attached.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt < max {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        target: "loader",
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "{what} failed, retrying"
                    );
                    counter!("measure_fetch_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(anyhow!("{what} failed after {attempt} attempt(s): {e:#}"));
            }
        }
    }
}
