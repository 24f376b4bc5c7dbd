//! Result cache
//!
//! Short-lived in-memory store for idempotent reads (holdings lookups).
//! Trade executions never go through here: replaying a cached fill would
//! report an order that was never placed.
//!
//! Expiry is absolute wall-clock time taken from the injected [`Clock`].
//! Expired entries are dropped lazily when looked up.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use shotgun_core::Timestamp;
use shotgun_ports::Clock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Key class for holdings lookups
pub const HOLDINGS_CLASS: &str = "holdings";

/// Cache tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for key classes without an override
    pub default_ttl_ms: u64,
    /// Per key class TTL overrides
    pub class_ttl_ms: HashMap<String, u64>,
    /// Upper bound on stored entries; the least recently set is evicted
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 5 * 60 * 1000,
            class_ttl_ms: HashMap::new(),
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, class: &str) -> Duration {
        Duration::from_millis(
            self.class_ttl_ms
                .get(class)
                .copied()
                .unwrap_or(self.default_ttl_ms),
        )
    }

    pub fn with_class_ttl(mut self, class: &str, ttl: Duration) -> Self {
        self.class_ttl_ms
            .insert(class.to_string(), ttl.as_millis() as u64);
        self
    }
}

/// Structured cache key: `<class>:<target>:<query>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub class: String,
    pub target: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(class: &str, target: &str, query: &str) -> Self {
        Self {
            class: class.to_string(),
            target: target.to_string(),
            query: query.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.class, self.target, self.query)
    }
}

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Timestamp,
    /// Insertion sequence, for least-recently-set eviction
    seq: u64,
}

/// TTL cache shared by every dispatch unit
pub struct ResultCache<V> {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, CacheEntry<V>>,
    seq: AtomicU64,
}

impl<V> ResultCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            entries: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh value for `key`, if any. An expired entry is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if now < entry.expires_at {
            return Some(entry.value.clone());
        }

        drop(entry);
        // Re-check under the write lock: a concurrent set may have refreshed it
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        debug!("cache entry {} expired", key);
        None
    }

    /// Store `value` under `key` for `ttl`.
    ///
    /// A TTL past the end of representable time never expires.
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = expiry(self.clock.now(), ttl);

        if !self.entries.contains_key(key) && self.entries.len() >= self.config.max_entries {
            self.evict_oldest();
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at,
                seq,
            },
        );
    }

    pub fn get_key(&self, key: &CacheKey) -> Option<V> {
        self.get(&key.to_string())
    }

    /// Store under a structured key with its class TTL
    pub fn set_key(&self, key: &CacheKey, value: V) {
        let ttl = self.config.ttl_for(&key.class);
        self.set(&key.to_string(), value, ttl);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry belonging to `target`
    pub fn invalidate_target(&self, target: &str) {
        let infix = format!(":{}:", target);
        self.entries.retain(|key, _| !key.contains(&infix));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Stored entries, expired ones included until looked up
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn close(&self) {
        self.clear();
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().seq)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            debug!("cache full, evicting {}", key);
            self.entries.remove(&key);
        }
    }
}

fn expiry(now: Timestamp, ttl: Duration) -> Timestamp {
    ChronoDuration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
