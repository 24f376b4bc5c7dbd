use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shotgun_core::Timestamp;
use shotgun_ports::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Frozen clock that only advances when told to
///
/// Lets cache expiry and session timestamps be tested without sleeping.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a manual clock
    ///
    /// # Arguments
    /// * `initial_time` - Optional starting time. If None, uses current wall time.
    pub fn new(initial_time: Option<Timestamp>) -> Arc<Self> {
        Arc::new(Self {
            current_time: RwLock::new(initial_time.unwrap_or_else(Utc::now)),
        })
    }

    /// Move time forward
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current_time.write();
        *current = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|delta| current.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Explicitly set the time
    ///
    /// Warning: This can move time backwards.
    pub fn set_time(&self, time: Timestamp) {
        *self.current_time.write() = time;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current_time.read()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
