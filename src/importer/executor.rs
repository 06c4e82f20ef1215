// ==========================================
// Framecraft catalog - import executor
// ==========================================
// Stage 4 of the import pipeline: apply an ImportPlan to storage in
// bounded batches. The executor owns the transactional boundary for
// destructive operations and never re-validates.
//
// - Progress is a watch channel: monotone fraction in [0,1], latest
//   value wins, the executor never blocks on a slow consumer.
// - Cancellation is cooperative: the flag is checked between batches,
//   never mid-batch. A batch is the atomic unit of interruptibility.
//   Cancelling after the first append/update batch has committed can
//   only stop further batches; committed ones stay committed.
// - Replace mode stages rows under a shadow generation and flips it in
//   one final transaction: concurrent readers see the old catalog or
//   the new one, never an empty or mixed state. Failure or cancellation
//   before the flip leaves the prior catalog untouched.
// - At most one active import job per wholesaler, enforced by the lock
//   registry. Imports for different wholesalers never block each other.
// ==========================================

use crate::clock::Clock;
use crate::domain::report::{
    FailedRow, ImportPlan, ImportProgress, ImportReport, PlanAction, PlannedRow,
};
use crate::domain::types::{ImportMode, JobState};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::CatalogRepository;
use crate::stats::StatsAggregator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

// ==========================================
// CancelFlag - cooperative cancellation
// ==========================================
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ==========================================
// ImportLockRegistry - per-wholesaler mutual exclusion
// ==========================================
// Map from wholesaler id to a scoped lock held for the duration of
// Importing. The guard releases on every exit path: success, failure or
// cancellation.
#[derive(Default)]
pub struct ImportLockRegistry {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

pub type ImportGuard = tokio::sync::OwnedMutexGuard<()>;

impl ImportLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the wholesaler's import lock without waiting. A second
    /// import while one is running is rejected immediately.
    pub fn try_acquire(&self, wholesaler_id: &str) -> ImportResult<ImportGuard> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(wholesaler_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.try_lock_owned()
            .map_err(|_| ImportError::ConcurrencyConflict(wholesaler_id.to_string()))
    }
}

// ==========================================
// ProgressTracker - state machine + progress publication
// ==========================================
// Enforces the job state machine and mirrors every transition into the
// watch channel.
pub struct ProgressTracker {
    state: JobState,
    fraction: f64,
    tx: watch::Sender<ImportProgress>,
}

impl ProgressTracker {
    pub fn new(tx: watch::Sender<ImportProgress>) -> Self {
        Self {
            state: JobState::Idle,
            fraction: 0.0,
            tx,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn transition(&mut self, to: JobState) -> ImportResult<()> {
        if !self.state.can_transition(to) {
            return Err(ImportError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        if to == JobState::Completed {
            self.fraction = 1.0;
        }
        self.publish();
        Ok(())
    }

    /// Progress only ever moves forward.
    pub fn set_fraction(&mut self, fraction: f64) {
        if fraction > self.fraction {
            self.fraction = fraction.min(1.0);
            self.publish();
        }
    }

    fn publish(&self) {
        // receiver may be gone; progress is best-effort
        let _ = self.tx.send(ImportProgress {
            state: self.state,
            fraction: self.fraction,
        });
    }
}

// ==========================================
// ImportExecutor
// ==========================================
pub struct ImportExecutor<R: CatalogRepository> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
}

impl<R: CatalogRepository> ImportExecutor<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, batch_size: usize) -> Self {
        Self {
            repo,
            clock,
            batch_size: batch_size.max(1),
        }
    }

    /// Apply the plan. Always resolves to a full ImportReport: partial
    /// failure, cancellation and replace-mode aborts are reported, not
    /// swallowed.
    #[instrument(skip(self, plan, tracker, cancel, started_at), fields(mode = %plan.mode))]
    pub async fn execute(
        &self,
        job_id: &str,
        plan: &ImportPlan,
        tracker: &mut ProgressTracker,
        cancel: &CancelFlag,
        started_at: Instant,
    ) -> ImportResult<ImportReport> {
        tracker.transition(JobState::Importing)?;

        let applied: Vec<&PlannedRow> = plan.applied_rows().collect();
        let outcome = match plan.mode {
            ImportMode::Replace => self.run_replace(plan, &applied, tracker, cancel).await,
            ImportMode::Append | ImportMode::Update => {
                self.run_incremental(plan, &applied, tracker, cancel).await
            }
        };

        tracker.transition(outcome.final_state)?;

        // post-commit stats; on a failed replace this reflects the
        // untouched prior catalog
        let stats = match self.repo.fetch_catalog(&plan.wholesaler_id).await {
            Ok(catalog) => {
                let last_updated = self.repo.last_updated(&plan.wholesaler_id).await.ok().flatten();
                Some(StatsAggregator.actual(catalog.iter(), last_updated))
            }
            Err(e) => {
                warn!(error = %e, "post-import stats unavailable");
                None
            }
        };

        let report = ImportReport {
            job_id: job_id.to_string(),
            wholesaler_id: plan.wholesaler_id.clone(),
            mode: plan.mode,
            final_state: outcome.final_state,
            total_rows: plan.validation.total_rows,
            valid: plan.validation.valid,
            invalid: plan.validation.invalid,
            inserted: outcome.inserted,
            updated: outcome.updated,
            unchanged: plan.count(PlanAction::Unchanged),
            skipped_duplicates: plan.count(PlanAction::SkipDuplicate),
            failed_rows: outcome.failed_rows,
            batches_committed: outcome.batches_committed,
            error: outcome.error,
            stats,
            elapsed_ms: started_at.elapsed().as_millis() as u64,
        };

        info!(
            final_state = %report.final_state,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped_duplicates,
            failed = report.failed_rows.len(),
            elapsed_ms = report.elapsed_ms,
            "import job finished"
        );
        Ok(report)
    }

    /// Replace: stage everything under a shadow generation, then one
    /// atomic swap.
    async fn run_replace(
        &self,
        plan: &ImportPlan,
        applied: &[&PlannedRow],
        tracker: &mut ProgressTracker,
        cancel: &CancelFlag,
    ) -> ExecOutcome {
        let wholesaler_id = &plan.wholesaler_id;

        let generation = match self.repo.begin_replace(wholesaler_id).await {
            Ok(g) => g,
            Err(e) => return ExecOutcome::failed(format!("could not open replace staging: {e}")),
        };

        let chunks: Vec<&[&PlannedRow]> = applied.chunks(self.batch_size).collect();
        // the final swap counts as one more step so the fraction only
        // reaches 1.0 once the new catalog is visible
        let total_steps = chunks.len() + 1;

        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                let _ = self.repo.abort_replace(wholesaler_id, generation).await;
                info!(wholesaler_id = %wholesaler_id, "replace cancelled before swap, catalog untouched");
                return ExecOutcome::cancelled(0);
            }

            let records: Vec<_> = chunk.iter().map(|r| r.record.clone()).collect();
            if let Err(e) = self
                .repo
                .stage_replace_batch(wholesaler_id, generation, &records)
                .await
            {
                let _ = self.repo.abort_replace(wholesaler_id, generation).await;
                warn!(batch = idx, error = %e, "replace batch failed, job aborted");
                let mut outcome =
                    ExecOutcome::failed(format!("batch {idx} failed during replace: {e}"));
                outcome.failed_rows = rows_as_failed(chunk, &e.to_string());
                return outcome;
            }
            tracker.set_fraction((idx + 1) as f64 / total_steps as f64);
        }

        if cancel.is_cancelled() {
            let _ = self.repo.abort_replace(wholesaler_id, generation).await;
            return ExecOutcome::cancelled(0);
        }

        match self
            .repo
            .commit_replace(wholesaler_id, generation, self.clock.now())
            .await
        {
            Ok(count) => {
                tracker.set_fraction(1.0);
                ExecOutcome {
                    final_state: JobState::Completed,
                    inserted: count,
                    updated: 0,
                    failed_rows: Vec::new(),
                    batches_committed: chunks.len(),
                    error: None,
                }
            }
            Err(e) => {
                let _ = self.repo.abort_replace(wholesaler_id, generation).await;
                ExecOutcome::failed(format!("replace swap failed: {e}"))
            }
        }
    }

    /// Append / update: every batch commits independently. Failures are
    /// recorded per row and the job keeps going; committed batches are
    /// never rolled back.
    async fn run_incremental(
        &self,
        plan: &ImportPlan,
        applied: &[&PlannedRow],
        tracker: &mut ProgressTracker,
        cancel: &CancelFlag,
    ) -> ExecOutcome {
        let wholesaler_id = &plan.wholesaler_id;
        let chunks: Vec<&[&PlannedRow]> = applied.chunks(self.batch_size).collect();
        let total_batches = chunks.len().max(1);

        let mut inserted = 0usize;
        let mut updated = 0usize;
        let mut failed_rows: Vec<FailedRow> = Vec::new();
        let mut batches_committed = 0usize;
        let mut cancelled = false;

        for (idx, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                info!(
                    wholesaler_id = %wholesaler_id,
                    batches_committed, "import cancelled between batches"
                );
                break;
            }

            let records: Vec<_> = chunk.iter().map(|r| r.record.clone()).collect();
            let result = match plan.mode {
                // update mode upserts so new and changed codes land in
                // one statement shape
                ImportMode::Update => self.repo.upsert_products(wholesaler_id, &records).await,
                _ => self.repo.insert_products(wholesaler_id, &records).await,
            };

            match result {
                Ok(_) => {
                    batches_committed += 1;
                    inserted += chunk
                        .iter()
                        .filter(|r| r.action == PlanAction::Insert)
                        .count();
                    updated += chunk
                        .iter()
                        .filter(|r| r.action == PlanAction::Overwrite)
                        .count();
                }
                Err(e) => {
                    warn!(batch = idx, error = %e, "batch failed, continuing with next batch");
                    failed_rows.extend(rows_as_failed(chunk, &e.to_string()));
                }
            }
            tracker.set_fraction((idx + 1) as f64 / total_batches as f64);
        }

        if batches_committed > 0 {
            if let Err(e) = self
                .repo
                .touch_last_updated(wholesaler_id, self.clock.now())
                .await
            {
                warn!(error = %e, "failed to stamp last_updated");
            }
        }

        let final_state = if cancelled {
            JobState::Cancelled
        } else if failed_rows.is_empty() {
            tracker.set_fraction(1.0);
            JobState::Completed
        } else {
            JobState::Failed
        };

        ExecOutcome {
            final_state,
            inserted,
            updated,
            failed_rows,
            batches_committed,
            error: None,
        }
    }
}

// internal accumulation for one executor run
struct ExecOutcome {
    final_state: JobState,
    inserted: usize,
    updated: usize,
    failed_rows: Vec<FailedRow>,
    batches_committed: usize,
    error: Option<String>,
}

impl ExecOutcome {
    fn failed(message: String) -> Self {
        Self {
            final_state: JobState::Failed,
            inserted: 0,
            updated: 0,
            failed_rows: Vec::new(),
            batches_committed: 0,
            error: Some(message),
        }
    }

    fn cancelled(batches_committed: usize) -> Self {
        Self {
            final_state: JobState::Cancelled,
            inserted: 0,
            updated: 0,
            failed_rows: Vec::new(),
            batches_committed,
            error: None,
        }
    }
}

fn rows_as_failed(chunk: &[&PlannedRow], message: &str) -> Vec<FailedRow> {
    chunk
        .iter()
        .map(|row| FailedRow {
            row_number: row.row_number,
            product_code: row.record.product_code.clone(),
            message: message.to_string(),
        })
        .collect()
}
