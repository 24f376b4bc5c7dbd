//! Shotgun Clock Infrastructure
//!
//! Wall-clock sources for components that stamp or expire state
//! (session creation time, result cache TTLs):
//!
//! - [`SystemClock`]: real UTC time, used in production
//! - [`ManualClock`]: frozen time that only moves when advanced, for tests
//!
//! ## Usage
//!
//! ```ignore
//! use shotgun_clock::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::from_millis(150));
//! assert!(clock.now() > before);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use shotgun_ports::Clock;
