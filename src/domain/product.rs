// ==========================================
// Framecraft catalog - product domain model
// ==========================================
// ProductRecord is the one catalog line item. Records are created,
// overwritten and deleted only by the import executor, under a single
// wholesaler's catalog ownership.
// ==========================================

use crate::domain::types::{Category, StockStatus, UnitType};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductRecord - one catalog line item
// ==========================================
// Invariant: product_code is unique within one wholesaler's catalog.
// Across wholesalers there is no uniqueness constraint.
//
// PartialEq is field-wise on purpose: update-mode imports compare the
// incoming record against the stored one and skip no-op overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    // ===== identity =====
    pub product_code: String,          // unique per wholesaler
    pub product_name: String,

    // ===== classification =====
    pub category: Category,
    pub subcategory: Option<String>,

    // ===== pricing =====
    pub unit_type: UnitType,           // default: linear_foot
    pub wholesale_price: f64,          // >= 0
    pub suggested_retail: Option<f64>, // >= 0; < wholesale is a warning

    // ===== ordering =====
    pub min_quantity: i64,             // positive, default 1
    pub pack_size: i64,                // positive, default 1
    pub lead_time: Option<String>,     // free-form ("2-3 weeks")

    // ===== availability =====
    pub stock_status: StockStatus,     // default: available
}

// ==========================================
// RawProductRow - import pipeline intermediate
// ==========================================
// Produced by the field mapper (header-matched, trimmed, empty -> None),
// consumed by the row validator. Lifetime: one validate/import pass only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProductRow {
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub unit_type: Option<String>,
    pub wholesale_price: Option<String>,
    pub suggested_retail: Option<String>,
    pub min_quantity: Option<String>,
    pub pack_size: Option<String>,
    pub lead_time: Option<String>,
    pub stock_status: Option<String>,

    // ===== meta =====
    pub row_number: usize,                 // 1-based data row (header = row 0)
    pub structural_error: Option<String>,  // field count mismatch, carried from the parser
}
