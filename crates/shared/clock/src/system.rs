use chrono::Utc;
use shotgun_core::Timestamp;
use shotgun_ports::Clock;

/// UTC wall clock used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tracks_wall_time() {
        let clock = SystemClock::new();
        let before = Utc::now();
        std::thread::sleep(Duration::from_millis(10));
        let observed = clock.now();

        assert!(observed >= before + chrono::Duration::milliseconds(10));
        assert!(observed <= Utc::now());
        assert_eq!(clock.name(), "SystemClock");
    }
}
