//! Runner errors

use shotgun_dispatch::DispatchError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid target config: {0}")]
    InvalidTarget(String),

    #[error("Target configured twice: {0}")]
    DuplicateTarget(String),
}

/// Everything that stops the binary before a report exists
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{0}")]
    Usage(String),

    #[error("{} invalid order(s):\n  {}", .0.len(), .0.join("\n  "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RunError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Usage(_) | RunError::Validation(_) => 2,
            RunError::Config(_) => 3,
            RunError::Dispatch(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
