//! Error types for the gateway crate

use thiserror::Error;

/// Gateway-level errors (adapter table maintenance)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("adapter already registered for target '{0}'")]
    DuplicateAdapter(String),

    #[error("no adapter registered for target '{0}'")]
    UnknownTarget(String),
}
