//! Error types for cabundler.
//!
//! Library crates use [`CaBundlerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Fetch, Parse, and MalformedRecord errors are all fatal to a build
//! invocation: a silently dropped record would produce an incomplete
//! trust bundle without signaling the operator.

use std::path::PathBuf;

/// Top-level error type for all cabundler operations.
#[derive(Debug, thiserror::Error)]
pub enum CaBundlerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while downloading a certificate report.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// CSV report is structurally invalid or missing expected columns.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A single report row is missing data required for filing.
    #[error("malformed record: {message}")]
    MalformedRecord { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CaBundlerError>;

impl CaBundlerError {
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

    /// Create a malformed-record error from any displayable message.
    pub fn malformed_record(msg: impl Into<String>) -> Self {
        Self::MalformedRecord {
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
