//! Error types for database operations

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum Error {
    /// SQLx database error
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row does not fit the document model
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for mindsync_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => mindsync_core::Error::NotFound(what),
            Error::Serialization(e) => mindsync_core::Error::Json(e),
            Error::Io(e) => mindsync_core::Error::Io(e),
            other => mindsync_core::Error::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindsync_core::ErrorKind;

    #[test]
    fn test_conversion_keeps_not_found() {
        let err: mindsync_core::Error = Error::NotFound("card 'x'".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: mindsync_core::Error = Error::Migration("bad".to_string()).into();
        assert!(matches!(err, mindsync_core::Error::Store(_)));
    }
}
