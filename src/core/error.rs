//! Structured error handling for the synthesis engine
//!
//! One crate-wide error enum covering every failure class the engine can
//! report, with a `Result` alias used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum TtsError {
    /// Invalid argument passed to an API entry point
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// A required file does not exist
    #[error("File not found: {path:?}")]
    FileNotFound { path: PathBuf },

    /// Reading a file failed after it was opened
    #[error("Failed to read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a file failed
    #[error("Failed to write {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The voice database is structurally invalid
    #[error("Invalid database format: {0}")]
    InvalidFormat(String),

    /// An allocation was refused
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// A unit recording is not a usable WAV file
    #[error("Invalid WAV file {path:?}: {reason}")]
    InvalidWav { path: PathBuf, reason: String },

    /// The database was produced by an incompatible engine version
    #[error("Unsupported database version {found} (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
}

impl TtsError {
    /// Classify an I/O error hit while reading `path`
    pub fn from_read_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            TtsError::FileNotFound { path: path.into() }
        } else {
            TtsError::FileRead {
                path: path.into(),
                source: err,
            }
        }
    }
}
