// ==========================================
// Framecraft catalog - domain type definitions
// ==========================================
// Enumerations shared by the import pipeline and storage.
// Serialized form: snake_case (matches the upload file schema and the DB)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a raw cell value before enum matching.
///
/// Suppliers hand-edit these files: "Linear Foot", "linear-foot" and
/// "LINEAR_FOOT" all mean `linear_foot`.
fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

// ==========================================
// Category - product category
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Frame,    // moulding / frame stock
    Mat,      // mat board
    Glazing,  // glass and acrylic
    Hardware, // hangers, wire, fittings
    Mounting, // foam board, adhesives
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Frame,
        Category::Mat,
        Category::Glazing,
        Category::Hardware,
        Category::Mounting,
        Category::Other,
    ];

    /// Parse a raw cell value (case/spacing tolerant).
    pub fn parse_token(raw: &str) -> Option<Category> {
        match normalize_token(raw).as_str() {
            "frame" => Some(Category::Frame),
            "mat" => Some(Category::Mat),
            "glazing" => Some(Category::Glazing),
            "hardware" => Some(Category::Hardware),
            "mounting" => Some(Category::Mounting),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Frame => "frame",
            Category::Mat => "mat",
            Category::Glazing => "glazing",
            Category::Hardware => "hardware",
            Category::Mounting => "mounting",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// UnitType - pricing unit
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    LinearFoot, // default for moulding
    SquareFoot,
    Each,
    Box,
    Sheet,
    Roll,
}

impl Default for UnitType {
    fn default() -> Self {
        UnitType::LinearFoot
    }
}

impl UnitType {
    pub const ALL: [UnitType; 6] = [
        UnitType::LinearFoot,
        UnitType::SquareFoot,
        UnitType::Each,
        UnitType::Box,
        UnitType::Sheet,
        UnitType::Roll,
    ];

    pub fn parse_token(raw: &str) -> Option<UnitType> {
        match normalize_token(raw).as_str() {
            "linear_foot" => Some(UnitType::LinearFoot),
            "square_foot" => Some(UnitType::SquareFoot),
            "each" => Some(UnitType::Each),
            "box" => Some(UnitType::Box),
            "sheet" => Some(UnitType::Sheet),
            "roll" => Some(UnitType::Roll),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::LinearFoot => "linear_foot",
            UnitType::SquareFoot => "square_foot",
            UnitType::Each => "each",
            UnitType::Box => "box",
            UnitType::Sheet => "sheet",
            UnitType::Roll => "roll",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// StockStatus - supplier stock status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    LowStock,
    OutOfStock,
    Discontinued,
}

impl Default for StockStatus {
    fn default() -> Self {
        StockStatus::Available
    }
}

impl StockStatus {
    pub const ALL: [StockStatus; 4] = [
        StockStatus::Available,
        StockStatus::LowStock,
        StockStatus::OutOfStock,
        StockStatus::Discontinued,
    ];

    pub fn parse_token(raw: &str) -> Option<StockStatus> {
        match normalize_token(raw).as_str() {
            "available" => Some(StockStatus::Available),
            "low_stock" => Some(StockStatus::LowStock),
            "out_of_stock" => Some(StockStatus::OutOfStock),
            "discontinued" => Some(StockStatus::Discontinued),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// ImportMode - catalog import policy
// ==========================================
// replace: drop the existing catalog, insert all valid rows
// append:  insert only new product codes, skip duplicates
// update:  insert new codes, overwrite existing ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    Replace,
    Append,
    Update,
}

impl ImportMode {
    pub fn parse_token(raw: &str) -> Option<ImportMode> {
        match normalize_token(raw).as_str() {
            "replace" => Some(ImportMode::Replace),
            "append" => Some(ImportMode::Append),
            "update" => Some(ImportMode::Update),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Replace => "replace",
            ImportMode::Append => "append",
            ImportMode::Update => "update",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// JobState - import job state machine
// ==========================================
// Idle -> Validating -> Validated -> Importing -> {Completed, Failed, Cancelled}
// Validated -> Validating (re-validation of a fresh upload)
// Cancelled is reachable only from Importing, and only before the final
// batch commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Validating,
    Validated,
    Importing,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Whether `self -> to` is a legal transition.
    pub fn can_transition(self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Idle, Validating)
                | (Validating, Validated)
                | (Validating, Failed)
                | (Validated, Validating)
                | (Validated, Importing)
                | (Importing, Completed)
                | (Importing, Failed)
                | (Importing, Cancelled)
        )
    }

    /// Terminal states release the per-wholesaler import lock.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Validating => "validating",
            JobState::Validated => "validated",
            JobState::Importing => "importing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_tolerant() {
        assert_eq!(Category::parse_token("Frame"), Some(Category::Frame));
        assert_eq!(Category::parse_token("  GLAZING "), Some(Category::Glazing));
        assert_eq!(Category::parse_token("lumber"), None);
    }

    #[test]
    fn test_unit_type_parse_spacing() {
        assert_eq!(UnitType::parse_token("Linear Foot"), Some(UnitType::LinearFoot));
        assert_eq!(UnitType::parse_token("square-foot"), Some(UnitType::SquareFoot));
        assert_eq!(UnitType::parse_token("each"), Some(UnitType::Each));
        assert_eq!(UnitType::parse_token("pallet"), None);
    }

    #[test]
    fn test_stock_status_default() {
        assert_eq!(StockStatus::default(), StockStatus::Available);
        assert_eq!(StockStatus::parse_token("Out Of Stock"), Some(StockStatus::OutOfStock));
    }

    #[test]
    fn test_import_mode_roundtrip() {
        for mode in [ImportMode::Replace, ImportMode::Append, ImportMode::Update] {
            assert_eq!(ImportMode::parse_token(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn test_job_state_legal_path() {
        use JobState::*;
        assert!(Idle.can_transition(Validating));
        assert!(Validating.can_transition(Validated));
        assert!(Validated.can_transition(Importing));
        assert!(Importing.can_transition(Completed));
        assert!(Importing.can_transition(Cancelled));
        // re-validation loop
        assert!(Validated.can_transition(Validating));
    }

    #[test]
    fn test_job_state_illegal_paths() {
        use JobState::*;
        assert!(!Idle.can_transition(Importing));
        assert!(!Validated.can_transition(Cancelled));
        assert!(!Completed.can_transition(Importing));
        assert!(!Cancelled.can_transition(Importing));
    }
}
