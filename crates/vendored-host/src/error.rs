//! Error types for vendored-host

use std::path::PathBuf;

/// Result type for vendored-host operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the source host or git
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },
}
