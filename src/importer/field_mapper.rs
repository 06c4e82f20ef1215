// ==========================================
// Framecraft catalog - field mapper
// ==========================================
// Stage 1 of the import pipeline: ParsedRow -> RawProductRow. Pure
// string extraction (trim, empty -> None); typed coercion belongs to
// the row validator so one row can accumulate several field errors.
// ==========================================

use crate::domain::product::RawProductRow;
use crate::importer::file_parser::ParsedRow;
use crate::importer::schema::ColumnId;

pub struct FieldMapper;

impl FieldMapper {
    pub fn map_row(&self, row: &ParsedRow) -> RawProductRow {
        RawProductRow {
            product_code: self.get(row, ColumnId::ProductCode),
            product_name: self.get(row, ColumnId::ProductName),
            category: self.get(row, ColumnId::Category),
            subcategory: self.get(row, ColumnId::Subcategory),
            unit_type: self.get(row, ColumnId::UnitType),
            wholesale_price: self.get(row, ColumnId::WholesalePrice),
            suggested_retail: self.get(row, ColumnId::SuggestedRetail),
            min_quantity: self.get(row, ColumnId::MinQuantity),
            pack_size: self.get(row, ColumnId::PackSize),
            lead_time: self.get(row, ColumnId::LeadTime),
            stock_status: self.get(row, ColumnId::StockStatus),
            row_number: row.row_number,
            structural_error: row.structural_error.clone(),
        }
    }

    fn get(&self, row: &ParsedRow, column: ColumnId) -> Option<String> {
        row.values.get(&column).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }
}
