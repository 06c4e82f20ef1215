// ==========================================
// Framecraft catalog - import pipeline orchestrator
// ==========================================
// Wires the pipeline stages together for one uploaded file:
// parse -> map -> validate -> reconcile -> report / plan.
// Pure with respect to storage; the caller supplies the existing
// catalog snapshot and the executor applies the resulting plan.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::product::ProductRecord;
use crate::domain::report::{ImportPlan, RowOutcome, RowStatus, RowWarning, ValidationReport};
use crate::domain::types::ImportMode;
use crate::importer::error::{ImportResult, ParseError};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, UploadParser};
use crate::importer::reconciler::Reconciler;
use crate::importer::row_validator::RowValidator;
use crate::stats::StatsAggregator;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// ValidationPass - output of one parse+validate+reconcile run
// ==========================================
pub struct ValidationPass {
    pub outcomes: Vec<RowOutcome>,
    pub warnings: Vec<RowWarning>,
    pub report: ValidationReport,
}

pub struct CatalogImporter {
    parser: Box<dyn FileParser>,
    mapper: FieldMapper,
    validator: RowValidator,
    reconciler: Reconciler,
    stats: StatsAggregator,
    config: ImportConfig,
}

impl CatalogImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            parser: Box::new(UploadParser),
            mapper: FieldMapper,
            validator: RowValidator,
            reconciler: Reconciler,
            stats: StatsAggregator,
            config: config.sanitized(),
        }
    }

    /// Run the full validation pass for one uploaded file against a
    /// snapshot of the wholesaler's existing catalog.
    #[instrument(skip(self, bytes, existing), fields(size = bytes.len()))]
    pub fn run_validation(
        &self,
        bytes: &[u8],
        wholesaler_id: &str,
        existing: &HashMap<String, ProductRecord>,
    ) -> ImportResult<ValidationPass> {
        if bytes.len() > self.config.max_file_bytes {
            return Err(ParseError::FileTooLarge {
                size: bytes.len(),
                limit: self.config.max_file_bytes,
            }
            .into());
        }

        // step 1: parse
        let parsed = self.parser.parse_rows(bytes)?;
        debug!(rows = parsed.len(), "file parsed");

        // step 2+3: map and validate
        let mut outcomes = Vec::with_capacity(parsed.len());
        let mut warnings = Vec::new();
        for row in &parsed {
            let raw = self.mapper.map_row(row);
            let validated = self.validator.validate_row(&raw);
            outcomes.push(validated.outcome);
            warnings.extend(validated.warnings);
        }

        // step 4: reconcile against the existing catalog
        let summary = self.reconciler.reconcile(&mut outcomes, existing);
        debug!(
            in_file_duplicates = summary.in_file_duplicates,
            catalog_duplicates = summary.catalog_duplicates,
            "reconciliation finished"
        );

        // step 5: aggregate the report
        let report = self.build_report(wholesaler_id, &outcomes, warnings.clone());
        info!(
            total = report.total_rows,
            valid = report.valid,
            invalid = report.invalid,
            duplicates = report.duplicates,
            "validation pass complete"
        );

        Ok(ValidationPass {
            outcomes,
            warnings,
            report,
        })
    }

    /// Derive the import plan for a validated pass under a chosen mode.
    pub fn build_plan(
        &self,
        wholesaler_id: &str,
        mode: ImportMode,
        pass: ValidationPass,
        existing: &HashMap<String, ProductRecord>,
    ) -> ImportPlan {
        self.reconciler
            .build_plan(wholesaler_id, mode, pass.outcomes, existing, pass.report)
    }

    fn build_report(
        &self,
        wholesaler_id: &str,
        outcomes: &[RowOutcome],
        warnings: Vec<RowWarning>,
    ) -> ValidationReport {
        let total_rows = outcomes.len();
        let invalid = outcomes
            .iter()
            .filter(|o| o.status == RowStatus::Invalid)
            .count();
        // duplicates stay a subset of valid rows: valid + invalid == total
        let valid = total_rows - invalid;
        let duplicates = outcomes
            .iter()
            .filter(|o| matches!(o.status, RowStatus::Duplicate | RowStatus::Update))
            .count();

        let errors: Vec<RowOutcome> = outcomes
            .iter()
            .filter(|o| o.status == RowStatus::Invalid)
            .cloned()
            .collect();
        let preview: Vec<RowOutcome> = outcomes
            .iter()
            .take(self.config.preview_limit)
            .cloned()
            .collect();

        let stats = self
            .stats
            .project(outcomes.iter().filter_map(|o| o.record.as_ref()));

        ValidationReport {
            wholesaler_id: wholesaler_id.to_string(),
            total_rows,
            valid,
            invalid,
            duplicates,
            warnings,
            errors,
            preview,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Category, StockStatus, UnitType};

    const HEADER: &str =
        "Product Code,Product Name,Category,Subcategory,Unit Type,Wholesale Price,Suggested Retail,Min Quantity,Pack Size,Lead Time,Stock Status";

    fn importer() -> CatalogImporter {
        CatalogImporter::new(ImportConfig::default())
    }

    fn existing_with(code: &str, price: f64) -> HashMap<String, ProductRecord> {
        let record = ProductRecord {
            product_code: code.to_string(),
            product_name: format!("Existing {code}"),
            category: Category::Frame,
            subcategory: None,
            unit_type: UnitType::LinearFoot,
            wholesale_price: price,
            suggested_retail: None,
            min_quantity: 1,
            pack_size: 1,
            lead_time: None,
            stock_status: StockStatus::Available,
        };
        [(code.to_string(), record)].into()
    }

    #[test]
    fn test_valid_plus_invalid_equals_total() {
        let csv = format!(
            "{HEADER}\n\
             FRM-1,Oak,frame,,linear_foot,4.25,,,,,\n\
             FRM-2,Ash,frame,,linear_foot,abc,,,,,\n\
             FRM-3,Pine,frame,,linear_foot,2.00,,,,,\n"
        );
        let pass = importer()
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .unwrap();

        assert_eq!(pass.report.total_rows, 3);
        assert_eq!(pass.report.valid + pass.report.invalid, 3);
        assert_eq!(pass.report.invalid, 1);
    }

    #[test]
    fn test_in_file_duplicate_scenario() {
        // 10 rows, 2 sharing a code, empty catalog: valid=9, invalid=1,
        // duplicates=0
        let mut csv = HEADER.to_string();
        for i in 0..9 {
            csv.push_str(&format!("\nP-{i},Item {i},other,,each,1.00,,,,,"));
        }
        csv.push_str("\nP-0,Item dup,other,,each,9.99,,,,,");

        let pass = importer()
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .unwrap();

        assert_eq!(pass.report.total_rows, 10);
        assert_eq!(pass.report.valid, 9);
        assert_eq!(pass.report.invalid, 1);
        assert_eq!(pass.report.duplicates, 0);
    }

    #[test]
    fn test_catalog_duplicates_counted() {
        let csv = format!("{HEADER}\nA1,Thing,other,,each,12.00,,,,,\nB2,Other,other,,each,3.00,,,,,\n");
        let pass = importer()
            .run_validation(csv.as_bytes(), "w1", &existing_with("A1", 10.0))
            .unwrap();

        assert_eq!(pass.report.valid, 2);
        assert_eq!(pass.report.duplicates, 1);
    }

    #[test]
    fn test_determinism_same_bytes_same_report() {
        let csv = format!(
            "{HEADER}\nA1,Thing,other,,each,12.00,,,,,\nB2,Bad,other,,each,oops,,,,,\n"
        );
        let imp = importer();
        let first = imp
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .unwrap();
        let second = imp
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .unwrap();

        let a = serde_json::to_string(&first.report).unwrap();
        let b = serde_json::to_string(&second.report).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_projected_stats_cover_valid_rows() {
        let csv = format!(
            "{HEADER}\nA1,Thing,frame,,each,10.00,,,,,\nB2,Other,mat,,each,2.00,,,,,\n"
        );
        let pass = importer()
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .unwrap();

        let stats = &pass.report.stats;
        assert_eq!(stats.total_products, 2);
        let range = stats.price_range.unwrap();
        assert_eq!(range.min, 2.00);
        assert_eq!(range.max, 10.00);
    }

    #[test]
    fn test_file_too_large_rejected() {
        let imp = CatalogImporter::new(ImportConfig {
            max_file_bytes: 10,
            ..Default::default()
        });
        let csv = format!("{HEADER}\nA,B,frame,,each,1.0,,,,,\n");
        assert!(imp
            .run_validation(csv.as_bytes(), "w1", &HashMap::new())
            .is_err());
    }
}
