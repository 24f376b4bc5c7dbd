//! Paper broker adapter
//!
//! Deterministic in-process brokerage used for dry runs, demos and tests.
//! Fills every order immediately against an in-memory book and can be
//! scripted to fail, stall or lack credentials.

mod adapter;
mod book;

pub use adapter::{PaperAdapter, PaperConfig};
pub use book::{Fill, PaperBook};
