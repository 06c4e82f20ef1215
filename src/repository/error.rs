// ==========================================
// Framecraft catalog - repository layer error types
// ==========================================
// Tool: thiserror derive macros
// ==========================================

use thiserror::Error;

/// Repository layer error type
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("record not found: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("database connection failed: {0}")]
    ConnectionError(String),

    #[error("database lock acquisition failed: {0}")]
    LockError(String),

    #[error("database transaction failed: {0}")]
    TransactionError(String),

    #[error("database query failed: {0}")]
    QueryError(String),

    #[error("unique constraint violation: {0}")]
    UniqueConstraintViolation(String),

    #[error("no staged replace generation for wholesaler {0}")]
    NoStagedGeneration(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg.clone())
            }
            _ => RepositoryError::QueryError(err.to_string()),
        }
    }
}

/// Result alias for the repository layer
pub type RepoResult<T> = Result<T, RepositoryError>;
