// ==========================================
// Framecraft catalog - validation / import reporting model
// ==========================================
// A ValidationReport is produced fresh for every uploaded file and is
// never persisted; it lives for one validate -> (optional) import round
// trip. The ImportReport is the complete accounting of a finished job:
// partial failure is always reported, never silent.
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::types::{Category, ImportMode, JobState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// FieldError - one failed field-level check
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,   // column in the upload schema ("wholesale_price")
    pub message: String, // human-readable reason
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ==========================================
// RowStatus - disposition of one input line
// ==========================================
// valid:     coerced cleanly, product code unseen so far
// invalid:   one or more field errors (excluded from any import)
// duplicate: product code already present in the wholesaler's catalog
// update:    duplicate that an update-mode plan will overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Valid,
    Invalid,
    Duplicate,
    Update,
}

// ==========================================
// RowOutcome - tagged result for one input line
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_number: usize, // 1-based data row; header is row 0
    pub status: RowStatus,
    pub record: Option<ProductRecord>, // present unless invalid
    pub field_errors: Vec<FieldError>,
}

impl RowOutcome {
    pub fn valid(row_number: usize, record: ProductRecord) -> Self {
        Self {
            row_number,
            status: RowStatus::Valid,
            record: Some(record),
            field_errors: Vec::new(),
        }
    }

    pub fn invalid(row_number: usize, field_errors: Vec<FieldError>) -> Self {
        Self {
            row_number,
            status: RowStatus::Invalid,
            record: None,
            field_errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == RowStatus::Valid
    }

    pub fn product_code(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.product_code.as_str())
    }
}

// ==========================================
// RowWarning - non-fatal advisory
// ==========================================
// Warnings never change a row's validity (e.g. suggested retail below
// wholesale price).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowWarning {
    pub row_number: usize,
    pub product_code: Option<String>,
    pub message: String,
}

// ==========================================
// CatalogStats - category counts and price range
// ==========================================
// Used both projected (over a report's valid rows, last_updated = None)
// and actual (over the committed catalog).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_products: u64,
    pub categories: BTreeMap<Category, u64>,
    pub price_range: Option<PriceRange>, // None for an empty catalog
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

// ==========================================
// ValidationReport - aggregate of one parse+validate pass
// ==========================================
// Invariant: valid + invalid == total_rows. duplicates is a subset of
// valid rows reclassified by the reconciliation engine, not a third
// bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub wholesaler_id: String,
    pub total_rows: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize, // codes already present in the catalog
    pub warnings: Vec<RowWarning>,
    pub errors: Vec<RowOutcome>,  // one entry per invalid row
    pub preview: Vec<RowOutcome>, // bounded sample for display
    pub stats: CatalogStats,      // projected over valid rows
}

// ==========================================
// ImportPlan - reconciled plan for one import job
// ==========================================
// Derived from a ValidationReport plus a chosen ImportMode. The executor
// trusts it and never re-validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPlan {
    pub wholesaler_id: String,
    pub mode: ImportMode,
    pub rows: Vec<PlannedRow>, // every valid row, with its disposition
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRow {
    pub row_number: usize,
    pub record: ProductRecord,
    pub action: PlanAction,
}

// What the executor will do with one valid row under the chosen mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Insert,        // new product code
    Overwrite,     // update mode, code exists and fields differ
    Unchanged,     // update mode, code exists and fields are identical
    SkipDuplicate, // append mode, code exists
}

impl ImportPlan {
    /// Rows the executor actually writes (inserts + overwrites).
    pub fn applied_rows(&self) -> impl Iterator<Item = &PlannedRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r.action, PlanAction::Insert | PlanAction::Overwrite))
    }

    pub fn count(&self, action: PlanAction) -> usize {
        self.rows.iter().filter(|r| r.action == action).count()
    }
}

// ==========================================
// ImportProgress - one-way progress notification
// ==========================================
// Published through a watch channel: latest value wins, the executor
// never blocks on a slow consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub state: JobState,
    pub fraction: f64, // monotone in [0, 1] while importing
}

impl Default for ImportProgress {
    fn default() -> Self {
        Self {
            state: JobState::Idle,
            fraction: 0.0,
        }
    }
}

// ==========================================
// FailedRow - one row that could not be committed
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRow {
    pub row_number: usize,
    pub product_code: String,
    pub message: String,
}

// ==========================================
// ImportReport - final accounting of one import job
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub job_id: String, // UUID
    pub wholesaler_id: String,
    pub mode: ImportMode,
    pub final_state: JobState, // Completed / Failed / Cancelled

    // ===== validation counts =====
    pub total_rows: usize,
    pub valid: usize,
    pub invalid: usize,

    // ===== applied counts (per mode) =====
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,          // update mode: no-op overwrites skipped
    pub skipped_duplicates: usize, // append mode

    // ===== failures =====
    pub failed_rows: Vec<FailedRow>,
    pub batches_committed: usize,
    pub error: Option<String>, // job-level failure reason, if any

    // ===== post-commit =====
    pub stats: Option<CatalogStats>, // actual stats after the job finished
    pub elapsed_ms: u64,
}
