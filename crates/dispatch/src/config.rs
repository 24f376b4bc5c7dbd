//! Engine configuration

use serde::{Deserialize, Serialize};
use shotgun_core::RateLimit;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::retry::RetryConfig;

/// Dispatch engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for a whole batch; pending units fail when it fires
    pub batch_timeout_ms: u64,
    /// Rate applied to targets the limiter has not been told about
    pub default_rate_limit: RateLimit,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 60_000,
            default_rate_limit: RateLimit::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
