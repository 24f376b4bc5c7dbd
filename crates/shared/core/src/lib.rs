//! Shotgun Core Domain
//!
//! Pure domain types for the Shotgun order dispatcher.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Dispatch inputs
    Instruction,
    QueryFilter,
    RateLimit,
    Side,
    Target,
    // Per-target state
    Holding,
    Holdings,
    Session,
    SessionHandle,
    // Dispatch outputs
    ExecutionReport,
    Outcome,
    OutcomeStatus,
    ReportKind,
    ReportSummary,
    UnitState,
};
pub use error::ValidationError;
pub use values::{Price, Quantity, Symbol, Timestamp};
