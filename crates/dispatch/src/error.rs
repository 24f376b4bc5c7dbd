//! Dispatch errors
//!
//! Only batch-level mistakes surface here. Anything that goes wrong for a
//! single (instruction, target) unit ends up in that unit's `Outcome`.

use shotgun_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Instruction batch is empty")]
    EmptyBatch,

    #[error("No enabled targets to dispatch to")]
    NoEnabledTargets,

    #[error("No adapter registered for target: {0}")]
    UnknownTarget(String),

    #[error("Duplicate target in batch: {0}")]
    DuplicateTarget(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session initialization failed for {target}: {reason}")]
    InitFailed { target: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
