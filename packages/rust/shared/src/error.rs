//! Error types for StrategyPipe.
//!
//! Library crates use [`StrategyPipeError`] via `thiserror`.
//! The server app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all StrategyPipe operations.
#[derive(Debug, thiserror::Error)]
pub enum StrategyPipeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Trigger request validation error (missing required fields).
    ///
    /// Surfaced synchronously to the HTTP caller; everything else is caught
    /// inside the background run.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Artifact fetch/write failure during session ingestion.
    #[error("ingestion error: {0}")]
    Ingestion(String),

    /// Gap-worksheet parsing or recommendation extraction error.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Report or slide-deck generation failure.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Artifact store upload failure. Downgraded to a null address at the
    /// pipeline boundary; never aborts a run on its own.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Downstream handoff delivery failure.
    #[error("handoff error: {0}")]
    Handoff(String),

    /// Session record database error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StrategyPipeError>;

impl StrategyPipeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
