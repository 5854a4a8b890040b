//! Exponential-backoff retry for fallible async collaborator calls.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Something that happened inside [`RetryPolicy::run_observed`].
#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent {
    /// Attempt `attempt` (1-based) failed and another attempt follows after `delay`.
    Retrying {
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// The final attempt failed; the error is returned to the caller.
    Exhausted { attempts: u32, error: String },
}

/// Retry parameters. The policy itself holds no state, so one value can drive any
/// number of concurrent calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            exponential_base: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        exponential_base: f64,
    ) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            exponential_base,
        }
    }

    /// Same policy with a different retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Backoff before retry number `attempt + 1` (zero-based, so attempt 0 waits `base_delay`).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self
            .exponential_base
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let secs = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }

    /// Runs `op` up to `max_retries + 1` times and returns the first success or the
    /// last error unchanged.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_observed(op, |_| {}).await
    }

    /// Like [`run`](Self::run), reporting every retry and the final exhaustion to `observe`.
    pub async fn run_observed<T, E, F, Fut, O>(&self, mut op: F, mut observe: O) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        O: FnMut(RetryEvent),
    {
        let mut attempt = 0u32;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= self.max_retries {
                error!(
                    max_retries = self.max_retries,
                    error = %err,
                    "Retries exhausted"
                );
                observe(RetryEvent::Exhausted {
                    attempts: attempt + 1,
                    error: err.to_string(),
                });
                return Err(err);
            }

            let delay = self.delay_for_attempt(attempt);
            warn!(
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Attempt failed, retrying"
            );
            observe(RetryEvent::Retrying {
                attempt: attempt + 1,
                delay,
                error: err.to_string(),
            });

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
