//! Shotgun Ports
//!
//! Port definitions (traits) for the Shotgun order dispatcher.
//! These define the boundaries between the dispatch engine and the
//! per-target protocol adapters it drives.

mod adapter;
mod clock;
mod error;

pub use adapter::{AdapterResponse, TargetAdapter};
pub use clock::Clock;
pub use error::{AdapterError, AdapterResult, ErrorClass};
