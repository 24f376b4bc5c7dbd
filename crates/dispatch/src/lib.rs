//! Shotgun Dispatch Engine
//!
//! Sends a batch of trading instructions to many independently
//! authenticated targets at once and reports one outcome per
//! (instruction, target) pair, whatever each target does:
//! - **Admission Limiter**: per-target call spacing
//! - **Result Cache**: short-TTL store for holdings lookups
//! - **Session Registry**: single-flight login per target
//! - **Retry Policy**: exponential backoff on transient errors
//! - **Dispatch Engine**: concurrent fan-out, batch deadline, ordered report
//!
//! ## Architecture
//!
//! ```text
//!  instructions × targets
//!          │
//!  ┌───────▼─────────────────────────────────────────────┐
//!  │                  Dispatch Engine                    │
//!  │   one task per unit ──► SessionRegistry (once/tgt)  │
//!  │                     ──► AdmissionLimiter (per tgt)  │
//!  │                     ──► RetryPolicy ─► adapter call │
//!  │                     ──► ResultCache (reads only)    │
//!  └───────┬─────────────────────────────────────────────┘
//!          │ outcome slots, (instruction, target) order
//!          ▼
//!   ExecutionReport
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod retry;
pub mod session;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheKey, HOLDINGS_CLASS, ResultCache};
pub use config::EngineConfig;
pub use engine::{DispatchEngine, DispatchPlan, PlanAction, PlannedTarget, ProgressSink};
pub use error::{DispatchError, Result, SessionError};
pub use limiter::AdmissionLimiter;
pub use retry::{RetryConfig, RetryOutcome, RetryPolicy};
pub use session::{SessionRegistry, SessionStatus};
