//! Shared database types for Gagasan
//!
//! Store implementations report failures through `RepositoryError`; the service
//! layer converts them into the caller-facing taxonomy.

use crate::error::Error;
use thiserror::Error;

/// Store-level error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    /// The persisted version moved on since the aggregate was read
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: i64, found: i64 },

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Whether the failed write may succeed when re-applied to fresh state
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::VersionConflict { .. })
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::NotFound("Record not found".to_string()),
            RepositoryError::AlreadyExists => Error::Conflict("Record already exists".to_string()),
            RepositoryError::VersionConflict { .. } => Error::Conflict(err.to_string()),
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Internal(msg),
        }
    }
}
