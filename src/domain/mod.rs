// ==========================================
// Framecraft catalog - domain model layer
// ==========================================
// Entities and types shared by the import pipeline, the repository and
// the API surface. No data access, no pipeline logic.
// ==========================================

pub mod product;
pub mod report;
pub mod types;

pub use product::{ProductRecord, RawProductRow};
pub use report::{
    CatalogStats, FailedRow, FieldError, ImportPlan, ImportProgress, ImportReport, PlanAction,
    PlannedRow, PriceRange, RowOutcome, RowStatus, RowWarning, ValidationReport,
};
pub use types::{Category, ImportMode, JobState, StockStatus, UnitType};
