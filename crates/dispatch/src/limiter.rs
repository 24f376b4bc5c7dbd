//! Admission limiter
//!
//! Per-target gate bounding how fast calls start. Each target owns a
//! reservation bucket with a burst of one: slots are handed out
//! `interval / requests` apart, so no more than `requests` calls start
//! within any rolling window of `interval`. Waiting happens outside every
//! lock, so callers for other targets are never held up.

use dashmap::DashMap;
use log::debug;
use parking_lot::Mutex;
use shotgun_core::RateLimit;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct TokenBucket {
    /// Minimum distance between two call starts
    spacing: Duration,
    /// Earliest instant the next caller may start
    next_slot: Option<Instant>,
}

impl TokenBucket {
    fn new(limit: RateLimit) -> Self {
        TokenBucket {
            spacing: limit.spacing(),
            next_slot: None,
        }
    }

    /// Claim the next free slot, FIFO among concurrent callers
    fn reserve(&mut self, now: Instant) -> Instant {
        let slot = match self.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        self.next_slot = Some(slot + self.spacing);
        slot
    }
}

/// Per-target admission gate
#[derive(Clone)]
pub struct AdmissionLimiter {
    default_limit: RateLimit,
    buckets: Arc<DashMap<String, Mutex<TokenBucket>>>,
}

impl AdmissionLimiter {
    /// Limiter applying `default_limit` to targets without their own entry
    pub fn new(default_limit: RateLimit) -> Self {
        AdmissionLimiter {
            default_limit,
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Configure a target only if it has no bucket yet
    pub fn ensure(&self, target: &str, limit: RateLimit) {
        self.buckets
            .entry(target.to_string())
            .or_insert_with(|| Mutex::new(TokenBucket::new(limit)));
    }

    /// Suspend the caller until a call to `target` may start.
    ///
    /// Never fails; the wait is bounded only by the target's own schedule.
    pub async fn await_slot(&self, target: &str) {
        let now = Instant::now();
        let slot = match self.buckets.get(target) {
            Some(bucket) => bucket.lock().reserve(now),
            None => self
                .buckets
                .entry(target.to_string())
                .or_insert_with(|| Mutex::new(TokenBucket::new(self.default_limit)))
                .lock()
                .reserve(now),
        };

        if slot > now {
            debug!(
                "{}: admission delayed {:?}",
                target,
                slot.duration_since(now)
            );
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Drop all per-target state
    pub fn close(&self) {
        self.buckets.clear();
    }
}

impl Default for AdmissionLimiter {
    fn default() -> Self {
        Self::new(RateLimit::default())
    }
}
