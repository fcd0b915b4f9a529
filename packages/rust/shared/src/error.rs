//! Error types for docstruct.
//!
//! The conversion engine itself is total and never returns these; they cover
//! the edges around it (config, file input, JSON, the program repository, and
//! explicit structural validation). App crates wrap this with `color-eyre`.

use std::path::PathBuf;

/// Top-level error type for all docstruct operations.
#[derive(Debug, thiserror::Error)]
pub enum DocStructError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input that could not be interpreted.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// JSON encoding or decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A structural invariant does not hold.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocStructError>;

impl DocStructError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
