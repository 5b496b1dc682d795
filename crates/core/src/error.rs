//! Error types for deck linting and rendering.
//!
//! Parsing, validation, and rendering are total and never produce these.
//! Only the boundary work (reading files, loading rule sets) can fail.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the edges of the deck pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// A rule set could not be decoded.
    #[error("Invalid rule set: {0}")]
    ConfigError(#[from] serde_json::Error),

    /// A `matches` predicate holds a regex that does not compile.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
