// ==========================================
// Framecraft catalog - import module error types
// ==========================================
// Tool: thiserror derive macros
//
// Propagation policy: field- and row-level problems are data (collected
// into reports), never errors. Only structural parse failures, state
// machine misuse, concurrency conflicts and replace-mode batch failures
// surface here.
// ==========================================

use crate::domain::types::JobState;
use thiserror::Error;

/// Structural parse failure - fatal to the whole operation, no partial
/// ValidationReport is produced.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("file is not readable as text: {0}")]
    UnreadableEncoding(String),

    #[error("header row is missing required columns: {0}")]
    MissingColumns(String),

    #[error("file contains no data rows")]
    EmptyFile,

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: usize, limit: usize },

    #[error("malformed tabular data: {0}")]
    Malformed(String),

    #[error("workbook parse failed: {0}")]
    Workbook(String),
}

/// Import module error type
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== structural parse failures =====
    #[error(transparent)]
    Parse(#[from] ParseError),

    // ===== job state machine =====
    #[error("invalid job state transition: {from} -> {to}")]
    InvalidStateTransition { from: JobState, to: JobState },

    // ===== concurrency =====
    #[error("an import is already running for wholesaler {0}")]
    ConcurrencyConflict(String),

    #[error("import cancelled before any batch committed")]
    Cancelled,

    // ===== storage =====
    #[error("batch {batch} failed to commit: {message}")]
    BatchFailure { batch: usize, message: String },

    #[error(transparent)]
    Repository(#[from] crate::repository::error::RepositoryError),

    // ===== misc =====
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

impl From<calamine::XlsxError> for ParseError {
    fn from(err: calamine::XlsxError) -> Self {
        ParseError::Workbook(err.to_string())
    }
}

/// Result alias for the import module
pub type ImportResult<T> = Result<T, ImportError>;
