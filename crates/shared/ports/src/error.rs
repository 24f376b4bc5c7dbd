use std::time::Duration;
use thiserror::Error;

/// How the retry policy should treat an adapter error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Worth another attempt (timeouts, throttling, 5xx)
    Transient,
    /// Retrying cannot help (auth, bad instruction, funds)
    Terminal,
    /// The adapter could not tell; handled as terminal
    Unclassified,
}

impl ErrorClass {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorClass::Transient)
    }
}

/// Errors raised by target adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited by target")]
    RateLimited { retry_after: Option<Duration> },

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("insufficient position: {0}")]
    InsufficientPosition(String),

    #[error("blocking call failed: {0}")]
    Blocking(String),

    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// Baseline classification adapters may delegate to.
    ///
    /// Anything not recognised is `Unclassified` so the retry policy never
    /// amplifies a request it does not understand.
    pub fn default_class(&self) -> ErrorClass {
        match self {
            AdapterError::Network(_) | AdapterError::Timeout | AdapterError::RateLimited { .. } => {
                ErrorClass::Transient
            }
            AdapterError::Server { status, .. } if *status >= 500 => ErrorClass::Transient,
            AdapterError::Server { .. }
            | AdapterError::AuthenticationRejected(_)
            | AdapterError::InvalidInstruction(_)
            | AdapterError::InsufficientFunds(_)
            | AdapterError::InsufficientPosition(_) => ErrorClass::Terminal,
            AdapterError::Blocking(_) | AdapterError::Other(_) => ErrorClass::Unclassified,
        }
    }

    /// Server-provided wait hint, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdapterError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
