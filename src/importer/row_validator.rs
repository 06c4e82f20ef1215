// ==========================================
// Framecraft catalog - row validator
// ==========================================
// Stage 2 of the import pipeline: RawProductRow -> RowOutcome. Pure and
// row-local; never consults the existing catalog. Each failed check is
// its own FieldError, so one row can report every problem it has at
// once. A row with zero field errors comes out Valid with a fully
// coerced ProductRecord (defaults applied).
// ==========================================

use crate::domain::product::{ProductRecord, RawProductRow};
use crate::domain::report::{FieldError, RowOutcome, RowWarning};
use crate::domain::types::{Category, StockStatus, UnitType};
use crate::importer::schema::ColumnId;

// ==========================================
// ValidatedRow - outcome plus advisories
// ==========================================
// Warnings never change validity; the report collects them separately.
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub outcome: RowOutcome,
    pub warnings: Vec<RowWarning>,
}

pub struct RowValidator;

impl RowValidator {
    pub fn validate_row(&self, raw: &RawProductRow) -> ValidatedRow {
        let mut errors: Vec<FieldError> = Vec::new();
        let mut warnings: Vec<RowWarning> = Vec::new();

        // structural problem carried from the parser (ragged row)
        if let Some(msg) = &raw.structural_error {
            errors.push(FieldError::new("row", msg.clone()));
        }

        let product_code = self.required_text(&raw.product_code, ColumnId::ProductCode, &mut errors);
        let product_name = self.required_text(&raw.product_name, ColumnId::ProductName, &mut errors);

        let category = match &raw.category {
            None => {
                errors.push(FieldError::new(
                    ColumnId::Category.field(),
                    "required field is missing",
                ));
                None
            }
            Some(value) => match Category::parse_token(value) {
                Some(c) => Some(c),
                None => {
                    errors.push(enum_error(ColumnId::Category, value, &Category::ALL.map(|c| c.as_str())));
                    None
                }
            },
        };

        let unit_type = match &raw.unit_type {
            None => Some(UnitType::default()),
            Some(value) => match UnitType::parse_token(value) {
                Some(u) => Some(u),
                None => {
                    errors.push(enum_error(ColumnId::UnitType, value, &UnitType::ALL.map(|u| u.as_str())));
                    None
                }
            },
        };

        let stock_status = match &raw.stock_status {
            None => Some(StockStatus::default()),
            Some(value) => match StockStatus::parse_token(value) {
                Some(s) => Some(s),
                None => {
                    errors.push(enum_error(
                        ColumnId::StockStatus,
                        value,
                        &StockStatus::ALL.map(|s| s.as_str()),
                    ));
                    None
                }
            },
        };

        let wholesale_price = match &raw.wholesale_price {
            None => {
                errors.push(FieldError::new(
                    ColumnId::WholesalePrice.field(),
                    "required field is missing",
                ));
                None
            }
            Some(value) => match parse_price(value) {
                Ok(p) => Some(p),
                Err(msg) => {
                    errors.push(FieldError::new(ColumnId::WholesalePrice.field(), msg));
                    None
                }
            },
        };

        let suggested_retail = match &raw.suggested_retail {
            None => None,
            Some(value) => match parse_price(value) {
                Ok(p) => Some(p),
                Err(msg) => {
                    errors.push(FieldError::new(ColumnId::SuggestedRetail.field(), msg));
                    None
                }
            },
        };

        let min_quantity = self.positive_int(&raw.min_quantity, ColumnId::MinQuantity, &mut errors);
        let pack_size = self.positive_int(&raw.pack_size, ColumnId::PackSize, &mut errors);

        // advisory: retail below wholesale is suspicious but not fatal
        if let (Some(wholesale), Some(retail)) = (wholesale_price, suggested_retail) {
            if retail < wholesale {
                warnings.push(RowWarning {
                    row_number: raw.row_number,
                    product_code: product_code.clone(),
                    message: format!(
                        "suggested retail {retail:.2} is below wholesale price {wholesale:.2}"
                    ),
                });
            }
        }

        let outcome = if errors.is_empty() {
            // every unwrap-free Some() is guaranteed by errors.is_empty()
            let record = ProductRecord {
                product_code: product_code.unwrap_or_default(),
                product_name: product_name.unwrap_or_default(),
                category: category.unwrap_or(Category::Other),
                subcategory: raw.subcategory.clone(),
                unit_type: unit_type.unwrap_or_default(),
                wholesale_price: wholesale_price.unwrap_or_default(),
                suggested_retail,
                min_quantity: min_quantity.unwrap_or(1),
                pack_size: pack_size.unwrap_or(1),
                lead_time: raw.lead_time.clone(),
                stock_status: stock_status.unwrap_or_default(),
            };
            RowOutcome::valid(raw.row_number, record)
        } else {
            RowOutcome::invalid(raw.row_number, errors)
        };

        ValidatedRow { outcome, warnings }
    }

    fn required_text(
        &self,
        value: &Option<String>,
        column: ColumnId,
        errors: &mut Vec<FieldError>,
    ) -> Option<String> {
        match value {
            Some(v) => Some(v.clone()),
            None => {
                errors.push(FieldError::new(column.field(), "required field is missing"));
                None
            }
        }
    }

    /// Positive integer with default 1 when omitted.
    fn positive_int(
        &self,
        value: &Option<String>,
        column: ColumnId,
        errors: &mut Vec<FieldError>,
    ) -> Option<i64> {
        match value {
            None => Some(1),
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n > 0 => Some(n),
                Ok(n) => {
                    errors.push(FieldError::new(
                        column.field(),
                        format!("must be a positive integer, got {n}"),
                    ));
                    None
                }
                Err(_) => {
                    errors.push(FieldError::new(
                        column.field(),
                        format!("not parseable as an integer: {raw}"),
                    ));
                    None
                }
            },
        }
    }
}

/// Parse a non-negative decimal price. Tolerates a leading currency
/// symbol and thousands separators; never silently coerces garbage to 0.
fn parse_price(raw: &str) -> Result<f64, String> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Ok(v) => Err(format!("must be a non-negative decimal, got {v}")),
        Err(_) => Err(format!("not parseable as a decimal: {raw}")),
    }
}

fn enum_error(column: ColumnId, value: &str, allowed: &[&str]) -> FieldError {
    FieldError::new(
        column.field(),
        format!("unknown value '{}', expected one of: {}", value, allowed.join(", ")),
    )
}
