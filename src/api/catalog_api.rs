// ==========================================
// Framecraft catalog - catalog API
// ==========================================
// The operations this subsystem exposes to the surrounding application.
// Knows nothing about HTTP, sessions or UI state; the web layer calls
// down here and renders whatever comes back.
//
// validate() is pure with respect to storage. import() is the only
// mutating operation and returns a handle: a progress watch receiver,
// a cancellation flag and the final ImportReport.
// ==========================================

use crate::clock::{Clock, SystemClock};
use crate::config::ImportConfig;
use crate::domain::product::ProductRecord;
use crate::domain::report::{CatalogStats, ImportPlan, ImportProgress, ImportReport, ValidationReport};
use crate::domain::types::{ImportMode, JobState};
use crate::api::error::ApiError;
use crate::importer::catalog_importer::CatalogImporter;
use crate::importer::error::ImportError;
use crate::importer::executor::{
    CancelFlag, ImportExecutor, ImportLockRegistry, ProgressTracker,
};
use crate::importer::template;
use crate::repository::{CatalogRepository, CatalogRepositoryImpl};
use crate::stats::StatsAggregator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// ImportHandle - one running import job
// ==========================================
// Cancellation is cooperative and asymmetric: before the first batch
// commits it aborts with zero side effects; after that (append/update)
// it only stops further batches, committed ones stay committed.
pub struct ImportHandle {
    pub job_id: String,
    pub progress: watch::Receiver<ImportProgress>,
    cancel: CancelFlag,
    task: JoinHandle<Result<ImportReport, ImportError>>,
}

impl ImportHandle {
    /// Request cooperative cancellation (checked between batches).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the job to finish and take its report.
    pub async fn wait(self) -> Result<ImportReport, ApiError> {
        match self.task.await {
            Ok(result) => result.map_err(ApiError::from),
            Err(e) => Err(ApiError::Internal(format!("import task panicked: {e}"))),
        }
    }
}

// ==========================================
// CatalogApi
// ==========================================
pub struct CatalogApi<R: CatalogRepository + 'static> {
    repo: Arc<R>,
    importer: Arc<CatalogImporter>,
    locks: Arc<ImportLockRegistry>,
    clock: Arc<dyn Clock>,
    config: ImportConfig,
}

impl CatalogApi<CatalogRepositoryImpl> {
    /// Open a SQLite-backed catalog API with the system clock.
    pub fn open(db_path: &str, config: ImportConfig) -> Result<Self, ApiError> {
        let repo = CatalogRepositoryImpl::new(db_path)?;
        Ok(Self::new(Arc::new(repo), Arc::new(SystemClock), config))
    }
}

impl<R: CatalogRepository + 'static> CatalogApi<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>, config: ImportConfig) -> Self {
        let config = config.sanitized();
        Self {
            repo,
            importer: Arc::new(CatalogImporter::new(config.clone())),
            locks: Arc::new(ImportLockRegistry::new()),
            clock,
            config,
        }
    }

    /// Validate an uploaded catalog file. Does not mutate the catalog.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn validate(
        &self,
        bytes: &[u8],
        wholesaler_id: &str,
    ) -> Result<ValidationReport, ApiError> {
        let existing = self.snapshot(wholesaler_id).await?;
        let pass = self
            .importer
            .run_validation(bytes, wholesaler_id, &existing)?;
        Ok(pass.report)
    }

    /// Start an import job. The per-wholesaler lock is taken before the
    /// job spawns, so a second import for the same wholesaler is
    /// rejected immediately with no state change. Imports for different
    /// wholesalers run concurrently.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn import(
        &self,
        bytes: Vec<u8>,
        wholesaler_id: &str,
        mode: ImportMode,
    ) -> Result<ImportHandle, ApiError> {
        let guard = self.locks.try_acquire(wholesaler_id)?;

        let job_id = Uuid::new_v4().to_string();
        let (tx, rx) = watch::channel(ImportProgress::default());
        let cancel = CancelFlag::new();

        info!(job_id = %job_id, "import job accepted");

        let repo = Arc::clone(&self.repo);
        let importer = Arc::clone(&self.importer);
        let clock = Arc::clone(&self.clock);
        let batch_size = self.config.batch_size;
        let wholesaler = wholesaler_id.to_string();
        let task_job_id = job_id.clone();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            // guard held for the whole job; released on every exit path
            let _guard = guard;
            run_import_job(
                repo,
                importer,
                clock,
                batch_size,
                bytes,
                wholesaler,
                mode,
                task_job_id,
                tx,
                task_cancel,
            )
            .await
        });

        Ok(ImportHandle {
            job_id,
            progress: rx,
            cancel,
            task,
        })
    }

    /// Convenience wrapper: run an import to completion, discarding
    /// intermediate progress.
    pub async fn import_and_wait(
        &self,
        bytes: Vec<u8>,
        wholesaler_id: &str,
        mode: ImportMode,
    ) -> Result<ImportReport, ApiError> {
        let handle = self.import(bytes, wholesaler_id, mode).await?;
        handle.wait().await
    }

    /// Blank schema file.
    pub fn template(&self) -> Result<Vec<u8>, ApiError> {
        template::template().map_err(ApiError::from)
    }

    /// Schema file with representative sample rows.
    pub fn example(&self) -> Result<Vec<u8>, ApiError> {
        template::example().map_err(ApiError::from)
    }

    /// Serialize the current catalog into the upload schema. The result
    /// re-imports under update mode with zero net changes.
    pub async fn export(&self, wholesaler_id: &str) -> Result<Vec<u8>, ApiError> {
        let catalog = self.repo.fetch_catalog(wholesaler_id).await?;
        template::export_catalog(&catalog).map_err(ApiError::from)
    }

    /// Delete every row of a wholesaler's catalog. Takes the same lock
    /// as import: clearing mid-import is rejected.
    #[instrument(skip(self))]
    pub async fn clear_catalog(&self, wholesaler_id: &str) -> Result<usize, ApiError> {
        let _guard = self.locks.try_acquire(wholesaler_id)?;
        let deleted = self
            .repo
            .clear_catalog(wholesaler_id, self.clock.now())
            .await?;
        info!(deleted, "catalog cleared");
        Ok(deleted)
    }

    /// Actual stats over the committed catalog.
    pub async fn stats(&self, wholesaler_id: &str) -> Result<CatalogStats, ApiError> {
        let catalog = self.repo.fetch_catalog(wholesaler_id).await?;
        let last_updated = self.repo.last_updated(wholesaler_id).await?;
        Ok(StatsAggregator.actual(catalog.iter(), last_updated))
    }

    async fn snapshot(
        &self,
        wholesaler_id: &str,
    ) -> Result<HashMap<String, ProductRecord>, ApiError> {
        let catalog = self.repo.fetch_catalog(wholesaler_id).await?;
        Ok(catalog
            .into_iter()
            .map(|record| (record.product_code.clone(), record))
            .collect())
    }
}

/// The body of one import job: validate under the lock, plan, execute.
#[allow(clippy::too_many_arguments)]
async fn run_import_job<R: CatalogRepository>(
    repo: Arc<R>,
    importer: Arc<CatalogImporter>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
    bytes: Vec<u8>,
    wholesaler_id: String,
    mode: ImportMode,
    job_id: String,
    tx: watch::Sender<ImportProgress>,
    cancel: CancelFlag,
) -> Result<ImportReport, ImportError> {
    let started = Instant::now();
    let mut tracker = ProgressTracker::new(tx);

    let plan = match validate_and_plan(&repo, &importer, &bytes, &wholesaler_id, mode, &mut tracker)
        .await
    {
        Ok(plan) => plan,
        Err(e) => {
            // structural failure before Importing: no side effects
            let _ = tracker.transition(JobState::Failed);
            return Err(e);
        }
    };

    let executor = ImportExecutor::new(repo, clock, batch_size);
    executor
        .execute(&job_id, &plan, &mut tracker, &cancel, started)
        .await
}

async fn validate_and_plan<R: CatalogRepository>(
    repo: &Arc<R>,
    importer: &Arc<CatalogImporter>,
    bytes: &[u8],
    wholesaler_id: &str,
    mode: ImportMode,
    tracker: &mut ProgressTracker,
) -> Result<ImportPlan, ImportError> {
    tracker.transition(JobState::Validating)?;

    let catalog = repo.fetch_catalog(wholesaler_id).await?;
    let existing: HashMap<String, ProductRecord> = catalog
        .into_iter()
        .map(|record| (record.product_code.clone(), record))
        .collect();

    let pass = importer.run_validation(bytes, wholesaler_id, &existing)?;
    tracker.transition(JobState::Validated)?;

    Ok(importer.build_plan(wholesaler_id, mode, pass, &existing))
}
