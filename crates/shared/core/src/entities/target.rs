use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ValidationError;

/// Allowed call rate for one target: `requests` per `interval_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests: u32,
    pub interval_ms: u64,
}

impl RateLimit {
    pub fn new(requests: u32, interval: Duration) -> Self {
        Self {
            requests,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// `requests` calls per second
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Minimum spacing between two consecutive call starts
    pub fn spacing(&self) -> Duration {
        if self.requests == 0 {
            return self.interval();
        }
        self.interval() / self.requests
    }

    pub fn is_valid(&self) -> bool {
        self.requests > 0 && self.interval_ms > 0
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        // 10 req/s when a target does not declare its own limit
        Self::per_second(10)
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}ms", self.requests, self.interval_ms)
    }
}

/// One remote endpoint a batch is fanned out to.
///
/// Derived from configuration and read-only for the duration of a
/// dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub enabled: bool,
    pub rate_limit: RateLimit,
    pub credentials_present: bool,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        rate_limit: RateLimit,
        credentials_present: bool,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyTargetName);
        }
        if !rate_limit.is_valid() {
            return Err(ValidationError::InvalidRateLimit { target: name });
        }

        Ok(Self {
            name,
            enabled: true,
            rate_limit,
            credentials_present,
        })
    }

    /// Same target, disabled in configuration
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// True when the engine should attempt this target at all
    pub fn is_attempted(&self) -> bool {
        self.enabled
    }
}
