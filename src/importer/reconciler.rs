// ==========================================
// Framecraft catalog - reconciliation engine
// ==========================================
// Stage 3 of the import pipeline: classify each valid row against the
// wholesaler's existing catalog and derive the per-row effect of the
// chosen import mode.
//
// Classification is mode-independent: Duplicate always means "this
// product code already exists in the catalog". Only the *effect* of a
// duplicate row (skip / overwrite) depends on the mode.
//
// Within one file, the first occurrence of a product code wins; later
// occurrences are demoted to Invalid with a duplicate-within-file error.
// Supplier files are operator-edited and not guaranteed code-unique.
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::report::{
    FieldError, ImportPlan, PlanAction, PlannedRow, RowOutcome, RowStatus, ValidationReport,
};
use crate::domain::types::ImportMode;
use std::collections::{HashMap, HashSet};

pub struct Reconciler;

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileSummary {
    pub in_file_duplicates: usize,
    pub catalog_duplicates: usize,
}

impl Reconciler {
    /// Finalize row statuses in place. Order of passes matters: a row
    /// demoted as an in-file duplicate never counts as a catalog
    /// duplicate.
    pub fn reconcile(
        &self,
        outcomes: &mut [RowOutcome],
        existing: &HashMap<String, ProductRecord>,
    ) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        let mut seen: HashSet<String> = HashSet::new();

        for outcome in outcomes.iter_mut() {
            if outcome.status != RowStatus::Valid {
                continue;
            }
            let code = match outcome.product_code() {
                Some(c) => c.to_string(),
                None => continue,
            };

            if !seen.insert(code.clone()) {
                // first occurrence wins; this one loses
                outcome.status = RowStatus::Invalid;
                outcome.record = None;
                outcome.field_errors.push(FieldError::new(
                    "product_code",
                    format!("duplicate product code within file: {code}"),
                ));
                summary.in_file_duplicates += 1;
                continue;
            }

            if existing.contains_key(&code) {
                outcome.status = RowStatus::Duplicate;
                summary.catalog_duplicates += 1;
            }
        }

        summary
    }

    /// Derive an ImportPlan from reconciled outcomes and a mode. The
    /// plan's embedded report reflects mode-specific preview statuses
    /// (update mode shows Update instead of Duplicate for rows it will
    /// overwrite).
    pub fn build_plan(
        &self,
        wholesaler_id: &str,
        mode: ImportMode,
        mut outcomes: Vec<RowOutcome>,
        existing: &HashMap<String, ProductRecord>,
        mut report: ValidationReport,
    ) -> ImportPlan {
        let mut rows = Vec::new();

        for outcome in outcomes.iter_mut() {
            let record = match (&outcome.status, &outcome.record) {
                (RowStatus::Valid, Some(r)) | (RowStatus::Duplicate, Some(r)) => r.clone(),
                _ => continue,
            };

            let action = match (mode, outcome.status) {
                // replace drops the old catalog first; every valid row
                // is a fresh insert
                (ImportMode::Replace, _) => PlanAction::Insert,
                (_, RowStatus::Valid) => PlanAction::Insert,
                (ImportMode::Append, RowStatus::Duplicate) => PlanAction::SkipDuplicate,
                (ImportMode::Update, RowStatus::Duplicate) => {
                    match existing.get(&record.product_code) {
                        Some(current) if *current == record => PlanAction::Unchanged,
                        _ => PlanAction::Overwrite,
                    }
                }
                _ => continue,
            };

            if mode == ImportMode::Update
                && matches!(action, PlanAction::Overwrite | PlanAction::Unchanged)
            {
                outcome.status = RowStatus::Update;
            }

            rows.push(PlannedRow {
                row_number: outcome.row_number,
                record,
                action,
            });
        }

        // mirror the mode-specific statuses into the report preview
        if mode == ImportMode::Update {
            let promoted: HashSet<usize> = outcomes
                .iter()
                .filter(|o| o.status == RowStatus::Update)
                .map(|o| o.row_number)
                .collect();
            for entry in report.preview.iter_mut() {
                if promoted.contains(&entry.row_number) {
                    entry.status = RowStatus::Update;
                }
            }
        }

        ImportPlan {
            wholesaler_id: wholesaler_id.to_string(),
            mode,
            rows,
            validation: report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Category, StockStatus, UnitType};

    fn record(code: &str, price: f64) -> ProductRecord {
        ProductRecord {
            product_code: code.to_string(),
            product_name: format!("Product {code}"),
            category: Category::Frame,
            subcategory: None,
            unit_type: UnitType::LinearFoot,
            wholesale_price: price,
            suggested_retail: None,
            min_quantity: 1,
            pack_size: 1,
            lead_time: None,
            stock_status: StockStatus::Available,
        }
    }

    fn valid_outcomes(codes: &[(&str, f64)]) -> Vec<RowOutcome> {
        codes
            .iter()
            .enumerate()
            .map(|(i, (code, price))| RowOutcome::valid(i + 1, record(code, *price)))
            .collect()
    }

    fn empty_report() -> ValidationReport {
        ValidationReport {
            wholesaler_id: "w1".to_string(),
            total_rows: 0,
            valid: 0,
            invalid: 0,
            duplicates: 0,
            warnings: Vec::new(),
            errors: Vec::new(),
            preview: Vec::new(),
            stats: Default::default(),
        }
    }

    #[test]
    fn test_in_file_duplicate_first_wins() {
        let mut outcomes = valid_outcomes(&[("A1", 1.0), ("B2", 2.0), ("A1", 3.0)]);
        let summary = Reconciler.reconcile(&mut outcomes, &HashMap::new());

        assert_eq!(summary.in_file_duplicates, 1);
        assert_eq!(outcomes[0].status, RowStatus::Valid);
        assert_eq!(outcomes[2].status, RowStatus::Invalid);
        assert!(outcomes[2]
            .field_errors
            .iter()
            .any(|e| e.message.contains("duplicate product code within file")));
    }

    #[test]
    fn test_catalog_duplicate_classification_mode_independent() {
        let existing: HashMap<String, ProductRecord> =
            [("A1".to_string(), record("A1", 10.0))].into();
        let mut outcomes = valid_outcomes(&[("A1", 12.0), ("C3", 5.0)]);
        let summary = Reconciler.reconcile(&mut outcomes, &existing);

        assert_eq!(summary.catalog_duplicates, 1);
        assert_eq!(outcomes[0].status, RowStatus::Duplicate);
        assert_eq!(outcomes[1].status, RowStatus::Valid);
    }

    #[test]
    fn test_plan_append_skips_duplicates() {
        let existing: HashMap<String, ProductRecord> =
            [("A1".to_string(), record("A1", 10.0))].into();
        let mut outcomes = valid_outcomes(&[("A1", 12.0), ("C3", 5.0)]);
        Reconciler.reconcile(&mut outcomes, &existing);

        let plan =
            Reconciler.build_plan("w1", ImportMode::Append, outcomes, &existing, empty_report());
        assert_eq!(plan.count(PlanAction::SkipDuplicate), 1);
        assert_eq!(plan.count(PlanAction::Insert), 1);
    }

    #[test]
    fn test_plan_update_overwrites_changed_rows() {
        let existing: HashMap<String, ProductRecord> =
            [("A1".to_string(), record("A1", 10.0))].into();
        let mut outcomes = valid_outcomes(&[("A1", 12.0), ("C3", 5.0)]);
        Reconciler.reconcile(&mut outcomes, &existing);

        let plan =
            Reconciler.build_plan("w1", ImportMode::Update, outcomes, &existing, empty_report());
        assert_eq!(plan.count(PlanAction::Overwrite), 1);
        assert_eq!(plan.count(PlanAction::Insert), 1);
    }

    #[test]
    fn test_plan_update_skips_identical_rows() {
        let existing: HashMap<String, ProductRecord> =
            [("A1".to_string(), record("A1", 10.0))].into();
        let mut outcomes = valid_outcomes(&[("A1", 10.0)]);
        Reconciler.reconcile(&mut outcomes, &existing);

        let plan =
            Reconciler.build_plan("w1", ImportMode::Update, outcomes, &existing, empty_report());
        assert_eq!(plan.count(PlanAction::Unchanged), 1);
        assert_eq!(plan.count(PlanAction::Overwrite), 0);
    }

    #[test]
    fn test_plan_replace_inserts_everything() {
        let existing: HashMap<String, ProductRecord> =
            [("A1".to_string(), record("A1", 10.0))].into();
        let mut outcomes = valid_outcomes(&[("A1", 12.0), ("C3", 5.0)]);
        Reconciler.reconcile(&mut outcomes, &existing);

        let plan =
            Reconciler.build_plan("w1", ImportMode::Replace, outcomes, &existing, empty_report());
        assert_eq!(plan.count(PlanAction::Insert), 2);
    }
}
