// ==========================================
// Framecraft shop management - wholesale catalog engine
// ==========================================
// Catalog import and reconciliation for the Framecraft framing-shop
// system. Ingests supplier catalog files, validates every row,
// reconciles against the existing catalog and commits under an import
// policy with per-row accounting and streaming progress.
// Tech stack: Rust + SQLite
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Import layer - the pipeline
pub mod importer;

// API layer - collaborator-facing operations
pub mod api;

// Configuration
pub mod config;

// Clock seam (collaborator-provided timestamps)
pub mod clock;

// Stats aggregator
pub mod stats;

// Database infrastructure (connection init / unified PRAGMA)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

// Domain types
pub use domain::types::{Category, ImportMode, JobState, StockStatus, UnitType};

// Domain entities and reports
pub use domain::{
    CatalogStats, FailedRow, FieldError, ImportPlan, ImportProgress, ImportReport, PlanAction,
    PriceRange, ProductRecord, RowOutcome, RowStatus, RowWarning, ValidationReport,
};

// Pipeline
pub use importer::{
    CancelFlag, CatalogImporter, CsvParser, ExcelParser, FileParser, ImportError, ImportExecutor,
    ImportLockRegistry, ParseError, Reconciler, RowValidator, UploadParser,
};

// API
pub use api::{ApiError, CatalogApi, ImportHandle};

// Repository
pub use repository::{CatalogRepository, CatalogRepositoryImpl, RepositoryError};

// Configuration
pub use config::ImportConfig;

// Clock
pub use clock::{Clock, FixedClock, SystemClock};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// System name
pub const APP_NAME: &str = "Framecraft Catalog Engine";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
