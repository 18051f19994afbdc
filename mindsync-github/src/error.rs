//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository name rejected before calling the API
    #[error("Invalid repository name: {0}")]
    InvalidName(String),

    /// Response did not carry a field we need
    #[error("Unexpected GitHub response: {0}")]
    Parse(String),
}

impl From<Error> for mindsync_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(msg) => mindsync_core::Error::RemoteAuth(msg),
            Error::InvalidName(msg) => mindsync_core::Error::Validation(msg),
            other => mindsync_core::Error::Git {
                command: "github".to_string(),
                message: other.to_string(),
            },
        }
    }
}
