//! Error types for MindSync

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for MindSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for MindSync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document, card, node, branch or history entry is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input was rejected (reserved branch name, malformed graph, missing field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is not allowed from the current state
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A git subcommand exited non-zero
    #[error("git {command} failed: {message}")]
    Git {
        /// Subcommand that failed, e.g. "push"
        command: String,
        /// Raw stderr (or stdout) of the tool
        message: String,
    },

    /// Missing or rejected access token
    #[error("Remote authentication failed: {0}")]
    RemoteAuth(String),

    /// A file under the working tree could not be read during import
    #[error("Failed to import {}: {message}", path.display())]
    ImportParse {
        /// Offending file
        path: PathBuf,
        /// Underlying reason
        message: String,
    },

    /// A git subcommand did not finish in time
    #[error("git {command} timed out after {after:?}")]
    Timeout {
        /// Subcommand that was killed
        command: String,
        /// Configured limit
        after: Duration,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(String),
}

/// Serializable error taxonomy surfaced to callers of mutating flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Forbidden,
    GitOperationFailure,
    RemoteAuthFailure,
    ImportParseFailure,
    Timeout,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::GitOperationFailure => "git_operation_failure",
            ErrorKind::RemoteAuthFailure => "remote_auth_failure",
            ErrorKind::ImportParseFailure => "import_parse_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// stderr fragments that mean the remote rejected our credentials
const AUTH_MARKERS: &[&str] = &[
    "authentication failed",
    "could not read username",
    "could not read password",
    "invalid username or password",
    "permission denied",
    "the requested url returned error: 403",
    "the requested url returned error: 401",
    "bad credentials",
];

/// stderr fragments that mean a ref or repository does not exist
const MISSING_MARKERS: &[&str] = &[
    "couldn't find remote ref",
    "repository not found",
    "does not appear to be a git repository",
    "unknown revision",
];

impl Error {
    /// Map this error onto the caller-facing taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Git { .. } => ErrorKind::GitOperationFailure,
            Error::RemoteAuth(_) => ErrorKind::RemoteAuthFailure,
            Error::ImportParse { .. } => ErrorKind::ImportParseFailure,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Io(_) | Error::Json(_) | Error::Config(_) | Error::Store(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Classify the output of a failed git invocation
    ///
    /// The raw tool message is always kept; only the variant changes.
    pub fn from_git_failure(command: impl Into<String>, stderr: &str) -> Self {
        let command = command.into();
        let message = stderr.trim().to_string();
        let lower = message.to_lowercase();

        if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
            return Error::RemoteAuth(message);
        }

        if MISSING_MARKERS.iter().any(|m| lower.contains(m)) {
            return Error::NotFound(format!("git {}: {}", command, message));
        }

        Error::Git { command, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_classified() {
        let err = Error::from_git_failure(
            "push",
            "remote: Invalid username or password.\nfatal: Authentication failed for 'https://github.com/o/r.git/'",
        );
        assert_eq!(err.kind(), ErrorKind::RemoteAuthFailure);
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_non_fast_forward_stays_git_failure() {
        let err = Error::from_git_failure(
            "push",
            " ! [rejected]        main -> main (non-fast-forward)\nerror: failed to push some refs",
        );
        assert_eq!(err.kind(), ErrorKind::GitOperationFailure);
        assert!(err.to_string().contains("non-fast-forward"));
    }

    #[test]
    fn test_missing_ref_classified() {
        let err = Error::from_git_failure("fetch", "fatal: couldn't find remote ref feature");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::RemoteAuthFailure).unwrap();
        assert_eq!(json, "\"remote_auth_failure\"");
    }
}
