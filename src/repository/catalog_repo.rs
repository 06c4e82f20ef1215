// ==========================================
// Framecraft catalog - catalog repository trait
// ==========================================
// Data access interface for a wholesaler's product catalog. Repository
// holds no business rules: disposition of rows is decided upstream by
// the reconciliation engine, the executor only calls down here.
// ==========================================

use crate::domain::product::ProductRecord;
use crate::repository::error::RepoResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// CatalogRepository Trait
// ==========================================
// Implementor: CatalogRepositoryImpl (rusqlite)
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ===== reads =====

    /// Fetch the active catalog for one wholesaler, ordered by product code.
    async fn fetch_catalog(&self, wholesaler_id: &str) -> RepoResult<Vec<ProductRecord>>;

    /// Count active rows for one wholesaler.
    async fn count_products(&self, wholesaler_id: &str) -> RepoResult<usize>;

    /// Timestamp of the last committed import / clear, if any.
    async fn last_updated(&self, wholesaler_id: &str) -> RepoResult<Option<DateTime<Utc>>>;

    // ===== incremental writes (append / update modes) =====
    // Each call commits in its own transaction; a failure leaves earlier
    // calls committed.

    /// Plain insert of one batch. Fails the batch on a duplicate product
    /// code (the plan should have filtered those).
    async fn insert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize>;

    /// Insert-or-overwrite of one batch (update mode).
    async fn upsert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize>;

    // ===== replace staging (shadow-generation swap) =====
    // Replace mode stages rows under a new generation that readers never
    // see, then one transaction flips the active generation and purges
    // the old rows. Concurrent readers observe the old catalog or the new
    // one, never an empty or mixed state.

    /// Open a staging generation for a replace. Discards any stale staged
    /// rows left behind by a crashed job.
    async fn begin_replace(&self, wholesaler_id: &str) -> RepoResult<i64>;

    /// Stage one batch into the given generation (own transaction,
    /// invisible to readers until commit_replace).
    async fn stage_replace_batch(
        &self,
        wholesaler_id: &str,
        generation: i64,
        products: &[ProductRecord],
    ) -> RepoResult<usize>;

    /// Atomically activate the staged generation and purge the old one.
    /// Returns the row count of the new catalog.
    async fn commit_replace(
        &self,
        wholesaler_id: &str,
        generation: i64,
        committed_at: DateTime<Utc>,
    ) -> RepoResult<usize>;

    /// Drop a staged generation without touching the active catalog.
    async fn abort_replace(&self, wholesaler_id: &str, generation: i64) -> RepoResult<()>;

    // ===== maintenance =====

    /// Delete every active row for a wholesaler. Returns the count deleted.
    async fn clear_catalog(
        &self,
        wholesaler_id: &str,
        cleared_at: DateTime<Utc>,
    ) -> RepoResult<usize>;

    /// Record the last-updated timestamp after a committed import.
    async fn touch_last_updated(&self, wholesaler_id: &str, at: DateTime<Utc>) -> RepoResult<()>;
}
