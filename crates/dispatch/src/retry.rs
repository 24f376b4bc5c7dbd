//! Retry policy
//!
//! Wraps one adapter call. Only errors the adapter classifies as
//! transient are retried, with exponential backoff plus jitter, bounded by
//! an attempt count and a total wait budget.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use shotgun_ports::{AdapterError, AdapterResult, ErrorClass};
use std::future::Future;
use std::time::Duration;

/// Backoff tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, first call included
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    /// Cap applied to every single delay
    pub max_backoff_ms: u64,
    pub multiplier: f64,
    /// Extra random delay, as a fraction of the computed delay
    pub jitter: f64,
    /// Budget for the sum of all delays
    pub max_total_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            multiplier: 2.0,
            jitter: 0.1,
            max_total_wait_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Single attempt, never retried
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_max_total_wait(mut self, duration: Duration) -> Self {
        self.max_total_wait_ms = duration.as_millis() as u64;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn max_total_wait(&self) -> Duration {
        Duration::from_millis(self.max_total_wait_ms)
    }

    /// Delay before retry number `retry` (0-based), jitter excluded
    pub fn backoff_for_retry(&self, retry: u32) -> Duration {
        let base = self.initial_backoff_ms as f64 * self.multiplier.powi(retry as i32);
        let capped = base.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Result of a retried call together with the number of calls made
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: AdapterResult<T>,
    pub attempts: u32,
}

/// Exponential backoff retry wrapper
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails non-transiently, or the
    /// attempt or wait budget is spent. The last error is returned on
    /// exhaustion.
    pub async fn run<T, F, Fut, C>(&self, label: &str, mut operation: F, classify: C) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AdapterResult<T>>,
        C: Fn(&AdapterError) -> ErrorClass,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut waited = Duration::ZERO;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let err = match operation().await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                    };
                }
                Err(err) => err,
            };

            match classify(&err) {
                ErrorClass::Transient => {}
                ErrorClass::Terminal => {
                    debug!("{}: terminal error on attempt {}: {}", label, attempts, err);
                    return RetryOutcome {
                        result: Err(err),
                        attempts,
                    };
                }
                ErrorClass::Unclassified => {
                    error!(
                        "{}: adapter left error unclassified, not retrying: {}",
                        label, err
                    );
                    return RetryOutcome {
                        result: Err(err),
                        attempts,
                    };
                }
            }

            if attempts >= max_attempts {
                warn!("{}: giving up after {} attempts: {}", label, attempts, err);
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                };
            }

            let delay = self.delay_for(attempts - 1, &err);
            if waited + delay > self.config.max_total_wait() {
                warn!(
                    "{}: retry wait budget of {:?} spent after {} attempts: {}",
                    label,
                    self.config.max_total_wait(),
                    attempts,
                    err
                );
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                };
            }

            debug!(
                "{}: transient error on attempt {}, retrying in {:?}: {}",
                label, attempts, delay, err
            );
            tokio::time::sleep(delay).await;
            waited += delay;
        }
    }

    fn delay_for(&self, retry: u32, err: &AdapterError) -> Duration {
        let cap = self.config.max_backoff();
        if let Some(hint) = err.retry_after() {
            return hint.min(cap);
        }

        let base = self.config.backoff_for_retry(retry);
        let jitter = base.mul_f64(self.config.jitter.max(0.0) * rand::random::<f64>());
        (base + jitter).min(cap)
    }
}
