//! Domain validation errors

use thiserror::Error;

/// Rejections raised while building an instruction or target.
///
/// These never reach a remote endpoint: a batch containing an invalid
/// instruction is refused before dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quantity must be a positive integer, got {0}")]
    NonPositiveQuantity(i64),

    #[error("symbol must be a non-empty string")]
    EmptySymbol,

    #[error("limit price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("unknown action '{0}', expected 'buy' or 'sell'")]
    UnknownAction(String),

    #[error("target name must be a non-empty string")]
    EmptyTargetName,

    #[error("rate limit for {target} must allow at least one request per non-zero interval")]
    InvalidRateLimit { target: String },
}
