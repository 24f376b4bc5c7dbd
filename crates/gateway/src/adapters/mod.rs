//! Target adapters
//!
//! Adapters convert an [`Instruction`](shotgun_core::Instruction) into a
//! target-specific call and normalize the reply into an
//! [`AdapterResponse`](shotgun_ports::AdapterResponse).

pub mod paper;

pub use paper::{PaperAdapter, PaperConfig};
