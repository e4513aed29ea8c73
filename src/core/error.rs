//! Error types for the augur library.

use thiserror::Error;

/// Result type alias using augur's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable errors: configuration loading and coverage export.
///
/// Invariant violations (a Truthness side outside (0, 1], an objective
/// value outside [0, 1], an unbalanced statement stack) are bugs in the
/// instrumentation, not runtime conditions; they panic instead of
/// appearing here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
