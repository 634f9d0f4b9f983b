//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A status guard or uniqueness rule rejected the write
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped to its domain type
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

impl From<coachdesk_types::ParseError> for DbError {
    fn from(e: coachdesk_types::ParseError) -> Self {
        Self::InvalidData(e.to_string())
    }
}

/// Result type for repository operations
pub type DbResult<T> = Result<T, DbError>;
