//! Error types for vendored-fs

use std::path::PathBuf;

/// Result type for vendored-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vendored-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON at {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    #[error("Expected a JSON object at {path}")]
    NotAnObject { path: PathBuf },

    #[error("Failed to serialize JSON for {path}: {message}")]
    JsonSerialize { path: PathBuf, message: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
