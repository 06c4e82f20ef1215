// ==========================================
// Framecraft catalog - API layer error types
// ==========================================
// Converts pipeline and repository errors into the shapes the
// surrounding web layer reports to users. Every error carries an
// explicit reason.
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API layer error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("an import is already running for wholesaler {0}")]
    ImportInProgress(String),

    #[error(transparent)]
    Import(ImportError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::ConcurrencyConflict(wholesaler_id) => {
                ApiError::ImportInProgress(wholesaler_id)
            }
            other => ApiError::Import(other),
        }
    }
}
