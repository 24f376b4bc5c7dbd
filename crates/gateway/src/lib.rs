//! Shotgun Gateway
//!
//! Gateway layer between the dispatch engine and remote brokerages. Provides:
//! - The explicit adapter table the engine resolves targets through
//! - Isolation of blocking SDK calls onto the blocking thread pool
//! - Target adapters (paper broker; live brokerages plug in the same way)
//!
//! ## Architecture
//!
//! ```text
//!        Dispatch Engine
//!              │ execute / query / classify_error
//!     ┌────────▼────────┐
//!     │ AdapterRegistry │  name -> Arc<dyn TargetAdapter>
//!     └───┬─────────┬───┘
//!         │         │
//!   ┌─────▼───┐ ┌───▼─────┐
//!   │  Paper  │ │  Live   │ ── run_blocking ──► blocking pool
//!   │ adapter │ │ adapter │
//!   └─────────┘ └─────────┘
//! ```

pub mod adapters;
pub mod blocking;
pub mod error;
pub mod registry;

// Re-export commonly used types
pub use adapters::paper::{PaperAdapter, PaperConfig};
pub use blocking::run_blocking;
pub use error::GatewayError;
pub use registry::AdapterRegistry;
