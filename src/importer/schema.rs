// ==========================================
// Framecraft catalog - upload file column schema
// ==========================================
// The column schema of a supplier catalog file is fixed and known in
// advance; matching is by header name, case-insensitive, column order
// does not matter. Shared by the parser (header resolution), the field
// mapper, the template generator and the exporter.
// ==========================================

// ==========================================
// ColumnId - canonical upload columns
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnId {
    ProductCode,
    ProductName,
    Category,
    Subcategory,
    UnitType,
    WholesalePrice,
    SuggestedRetail,
    MinQuantity,
    PackSize,
    LeadTime,
    StockStatus,
}

impl ColumnId {
    /// Schema order, used by template() / example() / export().
    pub const ALL: [ColumnId; 11] = [
        ColumnId::ProductCode,
        ColumnId::ProductName,
        ColumnId::Category,
        ColumnId::Subcategory,
        ColumnId::UnitType,
        ColumnId::WholesalePrice,
        ColumnId::SuggestedRetail,
        ColumnId::MinQuantity,
        ColumnId::PackSize,
        ColumnId::LeadTime,
        ColumnId::StockStatus,
    ];

    /// Canonical header as written in templates and exports.
    pub fn header(&self) -> &'static str {
        match self {
            ColumnId::ProductCode => "Product Code",
            ColumnId::ProductName => "Product Name",
            ColumnId::Category => "Category",
            ColumnId::Subcategory => "Subcategory",
            ColumnId::UnitType => "Unit Type",
            ColumnId::WholesalePrice => "Wholesale Price",
            ColumnId::SuggestedRetail => "Suggested Retail",
            ColumnId::MinQuantity => "Min Quantity",
            ColumnId::PackSize => "Pack Size",
            ColumnId::LeadTime => "Lead Time",
            ColumnId::StockStatus => "Stock Status",
        }
    }

    /// Field name used in FieldError entries.
    pub fn field(&self) -> &'static str {
        match self {
            ColumnId::ProductCode => "product_code",
            ColumnId::ProductName => "product_name",
            ColumnId::Category => "category",
            ColumnId::Subcategory => "subcategory",
            ColumnId::UnitType => "unit_type",
            ColumnId::WholesalePrice => "wholesale_price",
            ColumnId::SuggestedRetail => "suggested_retail",
            ColumnId::MinQuantity => "min_quantity",
            ColumnId::PackSize => "pack_size",
            ColumnId::LeadTime => "lead_time",
            ColumnId::StockStatus => "stock_status",
        }
    }

    /// Accepted header spellings beyond the canonical one. Supplier
    /// exports are hand-edited, these are the variants seen in practice.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            ColumnId::ProductCode => &["code", "sku", "item code"],
            ColumnId::ProductName => &["name", "description"],
            ColumnId::UnitType => &["unit"],
            ColumnId::WholesalePrice => &["wholesale", "cost"],
            ColumnId::SuggestedRetail => &["retail", "msrp", "suggested retail price"],
            ColumnId::MinQuantity => &["min qty", "minimum quantity"],
            ColumnId::PackSize => &["pack"],
            ColumnId::StockStatus => &["status", "availability"],
            _ => &[],
        }
    }
}

/// Columns whose absence from the header row fails the whole parse.
pub const REQUIRED_COLUMNS: [ColumnId; 5] = [
    ColumnId::ProductCode,
    ColumnId::ProductName,
    ColumnId::Category,
    ColumnId::UnitType,
    ColumnId::WholesalePrice,
];

/// Fold a header cell for comparison: case-insensitive, underscores and
/// hyphens treated as spaces, runs of whitespace collapsed.
fn fold_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve one header cell to a canonical column, or None for an
/// unrecognized (extra) column.
pub fn match_header(raw: &str) -> Option<ColumnId> {
    let folded = fold_header(raw);
    if folded.is_empty() {
        return None;
    }
    ColumnId::ALL.into_iter().find(|col| {
        fold_header(col.header()) == folded || col.aliases().iter().any(|a| *a == folded)
    })
}
