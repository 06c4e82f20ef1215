// ==========================================
// Framecraft catalog - template / example / export generation
// ==========================================
// Produces files in the exact upload schema. An exported catalog must
// re-import under update mode with zero net changes, so the value
// formatting here has to round-trip through the row validator exactly.
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::types::{Category, StockStatus, UnitType};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema::ColumnId;

/// Blank schema file: header row only.
pub fn template() -> ImportResult<Vec<u8>> {
    write_csv(&[])
}

/// Schema file with representative sample rows, one per category.
pub fn example() -> ImportResult<Vec<u8>> {
    let rows = sample_rows();
    write_csv(&rows)
}

/// Serialize a catalog back into the upload schema.
pub fn export_catalog(records: &[ProductRecord]) -> ImportResult<Vec<u8>> {
    write_csv(records)
}

fn write_csv(records: &[ProductRecord]) -> ImportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let headers: Vec<&str> = ColumnId::ALL.iter().map(|c| c.header()).collect();
    writer
        .write_record(&headers)
        .map_err(|e| ImportError::Internal(e.to_string()))?;

    for record in records {
        writer
            .write_record(&[
                record.product_code.clone(),
                record.product_name.clone(),
                record.category.as_str().to_string(),
                record.subcategory.clone().unwrap_or_default(),
                record.unit_type.as_str().to_string(),
                format_price(record.wholesale_price),
                record.suggested_retail.map(format_price).unwrap_or_default(),
                record.min_quantity.to_string(),
                record.pack_size.to_string(),
                record.lead_time.clone().unwrap_or_default(),
                record.stock_status.as_str().to_string(),
            ])
            .map_err(|e| ImportError::Internal(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ImportError::Internal(e.to_string()))
}

/// Two decimals for ordinary prices; fall back to the full shortest
/// representation when the stored value carries more precision, so the
/// exported text parses back to the identical f64.
fn format_price(value: f64) -> String {
    let cents = (value * 100.0).round() / 100.0;
    if cents == value {
        format!("{value:.2}")
    } else {
        value.to_string()
    }
}

fn sample_rows() -> Vec<ProductRecord> {
    vec![
        ProductRecord {
            product_code: "FRM-2150".to_string(),
            product_name: "Oak Scoop Moulding 2\"".to_string(),
            category: Category::Frame,
            subcategory: Some("wood".to_string()),
            unit_type: UnitType::LinearFoot,
            wholesale_price: 4.25,
            suggested_retail: Some(9.95),
            min_quantity: 1,
            pack_size: 1,
            lead_time: Some("1-2 weeks".to_string()),
            stock_status: StockStatus::Available,
        },
        ProductRecord {
            product_code: "MAT-801".to_string(),
            product_name: "Conservation Mat Board 32x40 Antique White".to_string(),
            category: Category::Mat,
            subcategory: Some("conservation".to_string()),
            unit_type: UnitType::Sheet,
            wholesale_price: 6.80,
            suggested_retail: Some(14.00),
            min_quantity: 5,
            pack_size: 25,
            lead_time: None,
            stock_status: StockStatus::Available,
        },
        ProductRecord {
            product_code: "GLZ-3340".to_string(),
            product_name: "UV Conservation Glass 32x40".to_string(),
            category: Category::Glazing,
            subcategory: Some("uv".to_string()),
            unit_type: UnitType::Sheet,
            wholesale_price: 18.50,
            suggested_retail: Some(42.00),
            min_quantity: 1,
            pack_size: 6,
            lead_time: Some("3-5 days".to_string()),
            stock_status: StockStatus::LowStock,
        },
        ProductRecord {
            product_code: "HDW-77".to_string(),
            product_name: "D-Ring Hanger Brass Plated".to_string(),
            category: Category::Hardware,
            subcategory: None,
            unit_type: UnitType::Box,
            wholesale_price: 11.20,
            suggested_retail: None,
            min_quantity: 1,
            pack_size: 100,
            lead_time: None,
            stock_status: StockStatus::Available,
        },
        ProductRecord {
            product_code: "MNT-12".to_string(),
            product_name: "Acid-Free Foam Board 32x40 3/16\"".to_string(),
            category: Category::Mounting,
            subcategory: Some("foam".to_string()),
            unit_type: UnitType::Sheet,
            wholesale_price: 3.95,
            suggested_retail: Some(8.25),
            min_quantity: 10,
            pack_size: 25,
            lead_time: None,
            stock_status: StockStatus::Available,
        },
        ProductRecord {
            product_code: "OTH-5".to_string(),
            product_name: "Fletcher Framing Points".to_string(),
            category: Category::Other,
            subcategory: None,
            unit_type: UnitType::Each,
            wholesale_price: 7.40,
            suggested_retail: Some(12.99),
            min_quantity: 1,
            pack_size: 1,
            lead_time: Some("in stock".to_string()),
            stock_status: StockStatus::Discontinued,
        },
    ]
}
