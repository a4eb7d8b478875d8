//! Small retry policy for transient API failures

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::Result;

/// Retries an operation a fixed number of times with linear backoff
///
/// Only errors for which [`crate::Error::is_transient`] holds are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy; `attempts` counts the first call and is at least 1
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Create a policy from pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_backoff)
    }

    /// Total attempts, including the first one
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = %what,
                        attempt,
                        max_attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
