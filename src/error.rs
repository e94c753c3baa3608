//! Error types and handling infrastructure for compfile.
//!
//! The library reports failures through [`CompFileError`] built with `thiserror`.
//! Errors coming from the compression engines and the file system are carried
//! unchanged in [`CompFileError::Io`], so callers can still branch on
//! [`std::io::ErrorKind`]. Application code (the `compfile` binary) layers
//! `anyhow` context on top.

use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// The main error type for compfile operations.
#[derive(Error, Debug)]
pub enum CompFileError {
    /// No registered predicate recognised the path (strict resolution only)
    #[error("Cannot infer compression engine for: {path}")]
    EngineNotFound { path: PathBuf },

    /// Error raised by the file system or the compression engine, passed through as-is
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operation attempted on a handle that has already been closed
    #[error("I/O operation on closed file")]
    Closed,

    /// Mode string outside the supported grammar
    #[error("Invalid mode '{mode}': {reason}")]
    InvalidMode { mode: String, reason: String },

    /// Text passed to a binary handle, bytes passed to a text handle, or a
    /// byte-only operation requested in text mode
    #[error("Content mismatch: expected {expected}")]
    ContentMismatch { expected: &'static str },

    /// Text-mode data that does not decode as UTF-8
    #[error("Invalid UTF-8 in text stream: {0}")]
    Decode(#[from] FromUtf8Error),

    /// Invalid glob pattern given to a predicate builder
    #[error("Invalid file name pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Standard Result type for compfile operations.
pub type Result<T> = std::result::Result<T, CompFileError>;

impl CompFileError {
    /// Create an InvalidMode error for the given mode string
    pub fn invalid_mode(mode: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMode {
            mode: mode.into(),
            reason: reason.into(),
        }
    }

    /// Create a Config error with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The underlying I/O error kind, if this error came from the engine
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}
