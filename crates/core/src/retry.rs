//! Reusable retry policy with exponential backoff.
//!
//! Every suspension point that talks to the outside world (listing fetch,
//! asset download, converter invocation) runs under the same policy: a
//! bounded number of attempts with a doubling delay, where rate-limited
//! responses back off longer than generic transient failures.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How an error should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Not worth retrying, return the error immediately.
    Fatal,
    /// Retry with the standard backoff.
    Transient,
    /// Retry with a longer backoff (e.g. HTTP 429).
    RateLimited,
}

/// Classification hook implemented by retryable error types.
pub trait RetryClassify {
    fn retry_class(&self) -> RetryClass;
}

/// Retry configuration as it appears in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Multiplier applied on top of the backoff for rate-limited errors.
    #[serde(default = "default_rate_limit_factor")]
    pub rate_limit_factor: u32,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_rate_limit_factor() -> u32 {
    4
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            rate_limit_factor: default_rate_limit_factor(),
        }
    }
}

/// An explicit retry policy applied at each suspension point.
///
/// The policy is a value, not control flow: callers hand it an async
/// operation and get back either the operation's result or its last error.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    rate_limit_factor: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_millis(default_max_delay_ms()),
            rate_limit_factor: default_rate_limit_factor(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            rate_limit_factor: config.rate_limit_factor.max(1),
        }
    }

    /// Sets the cap on a single backoff delay.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Runs `op` until it succeeds, fails fatally, or attempts run out.
    ///
    /// The closure receives the zero-based attempt number, mostly useful for
    /// logging. The last error is returned when attempts are exhausted.
    pub async fn run<T, E, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClassify + Display,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let class = e.retry_class();
                    attempt += 1;
                    if class == RetryClass::Fatal || attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt, class);
                    debug!(
                        op = op_name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Like [`run`](Self::run) but settles to `fallback` instead of an error.
    ///
    /// Used where exhaustion is an expected signal rather than a failure,
    /// e.g. a page fetch reporting "no data".
    pub async fn run_with_fallback<T, E, F, Fut>(&self, op_name: &str, fallback: T, op: F) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClassify + Display,
    {
        self.run(op_name, op).await.unwrap_or(fallback)
    }

    /// Backoff for the given attempt: base doubling per attempt, capped,
    /// with rate-limited errors waiting `rate_limit_factor` times longer.
    fn delay_for(&self, attempt: u32, class: RetryClass) -> Duration {
        let shift = attempt.saturating_sub(1).min(20);
        let mut millis = (self.base_delay.as_millis() as u64).saturating_mul(1u64 << shift);
        if class == RetryClass::RateLimited {
            millis = millis.saturating_mul(self.rate_limit_factor as u64);
        }
        Duration::from_millis(millis).min(self.max_delay)
    }
}
