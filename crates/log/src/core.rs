//! Error type for logger initialisation

use thiserror::Error;

/// Errors raised while installing the global subscriber
#[derive(Debug, Error)]
pub enum LogError {
    /// The filter directive could not be parsed
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// Unknown output format name
    #[error("Unknown log format: {0}")]
    Format(String),

    /// A global subscriber was already installed
    #[error("Logger already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Result alias for logging setup
pub type LogResult<T> = Result<T, LogError>;
