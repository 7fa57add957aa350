//! Error types for vendored-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] vendored_core::Error),

    #[error(transparent)]
    Fs(#[from] vendored_fs::Error),

    #[error(transparent)]
    Host(#[from] vendored_host::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },

    /// Failure already reported on stdout; only the exit code remains.
    #[error("{summary}")]
    Reported { summary: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    /// Actionable suggestion printed under the error.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Core(e) => e.hint(),
            Self::Host(vendored_host::Error::NotARepository { .. }) => {
                Some("Run vendored from inside a git checkout".to_string())
            }
            _ => None,
        }
    }
}
