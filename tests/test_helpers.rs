// ==========================================
// Test helpers
// ==========================================
// Temp database setup, API construction and CSV builders shared by the
// integration tests.
// ==========================================
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use framecraft_catalog::{CatalogApi, CatalogRepositoryImpl, FixedClock, ImportConfig};
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const HEADER: &str = "Product Code,Product Name,Category,Subcategory,Unit Type,Wholesale Price,Suggested Retail,Min Quantity,Pack Size,Lead Time,Stock Status";

/// Fixed timestamp used by every test clock.
pub fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Create a temp database file (kept alive by the returned handle).
pub fn create_test_db() -> (NamedTempFile, String) {
    let temp_file = NamedTempFile::new().expect("failed to create temp db");
    let db_path = temp_file.path().to_str().expect("temp path utf8").to_string();
    (temp_file, db_path)
}

/// Build a CatalogApi over a fresh repository, sharing the repo handle
/// so tests can inspect storage directly.
pub fn build_api(db_path: &str) -> (CatalogApi<CatalogRepositoryImpl>, Arc<CatalogRepositoryImpl>) {
    build_api_with_config(db_path, ImportConfig::default())
}

pub fn build_api_with_config(
    db_path: &str,
    config: ImportConfig,
) -> (CatalogApi<CatalogRepositoryImpl>, Arc<CatalogRepositoryImpl>) {
    let repo = Arc::new(CatalogRepositoryImpl::new(db_path).expect("failed to create repo"));
    let api = CatalogApi::new(Arc::clone(&repo), Arc::new(FixedClock(test_time())), config);
    (api, repo)
}

/// Assemble a CSV upload from data rows.
pub fn csv_file(rows: &[String]) -> Vec<u8> {
    let mut text = HEADER.to_string();
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text.push('\n');
    text.into_bytes()
}

/// One well-formed data row with the given code, category and price.
pub fn row(code: &str, name: &str, category: &str, price: &str) -> String {
    format!("{code},{name},{category},,each,{price},,,,,")
}

/// A batch of n generated rows, codes P-0 .. P-(n-1).
pub fn generated_rows(n: usize, price: f64) -> Vec<String> {
    (0..n)
        .map(|i| row(&format!("P-{i}"), &format!("Item {i}"), "other", &format!("{price:.2}")))
        .collect()
}

// ==========================================
// SlowRepo - delay-injecting repository wrapper
// ==========================================
// Stretches reads and writes so concurrency and cancellation tests can
// observe a job mid-flight deterministically.
use async_trait::async_trait;
use framecraft_catalog::repository::{error::RepoResult, CatalogRepository};
use framecraft_catalog::ProductRecord;
use std::time::Duration;

pub struct SlowRepo {
    inner: CatalogRepositoryImpl,
    read_delay: Duration,
    write_delay: Duration,
}

impl SlowRepo {
    pub fn new(db_path: &str, read_delay: Duration, write_delay: Duration) -> Self {
        Self {
            inner: CatalogRepositoryImpl::new(db_path).expect("failed to create repo"),
            read_delay,
            write_delay,
        }
    }
}

#[async_trait]
impl CatalogRepository for SlowRepo {
    async fn fetch_catalog(&self, wholesaler_id: &str) -> RepoResult<Vec<ProductRecord>> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.fetch_catalog(wholesaler_id).await
    }

    async fn count_products(&self, wholesaler_id: &str) -> RepoResult<usize> {
        self.inner.count_products(wholesaler_id).await
    }

    async fn last_updated(
        &self,
        wholesaler_id: &str,
    ) -> RepoResult<Option<DateTime<Utc>>> {
        self.inner.last_updated(wholesaler_id).await
    }

    async fn insert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        tokio::time::sleep(self.write_delay).await;
        self.inner.insert_products(wholesaler_id, products).await
    }

    async fn upsert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        tokio::time::sleep(self.write_delay).await;
        self.inner.upsert_products(wholesaler_id, products).await
    }

    async fn begin_replace(&self, wholesaler_id: &str) -> RepoResult<i64> {
        self.inner.begin_replace(wholesaler_id).await
    }

    async fn stage_replace_batch(
        &self,
        wholesaler_id: &str,
        generation: i64,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        tokio::time::sleep(self.write_delay).await;
        self.inner
            .stage_replace_batch(wholesaler_id, generation, products)
            .await
    }

    async fn commit_replace(
        &self,
        wholesaler_id: &str,
        generation: i64,
        committed_at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        self.inner
            .commit_replace(wholesaler_id, generation, committed_at)
            .await
    }

    async fn abort_replace(&self, wholesaler_id: &str, generation: i64) -> RepoResult<()> {
        self.inner.abort_replace(wholesaler_id, generation).await
    }

    async fn clear_catalog(
        &self,
        wholesaler_id: &str,
        cleared_at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        self.inner.clear_catalog(wholesaler_id, cleared_at).await
    }

    async fn touch_last_updated(
        &self,
        wholesaler_id: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.inner.touch_last_updated(wholesaler_id, at).await
    }
}

/// Build a CatalogApi over a SlowRepo plus a plain repo handle on the
/// same database for direct inspection.
pub fn build_slow_api(
    db_path: &str,
    read_delay: Duration,
    write_delay: Duration,
    config: ImportConfig,
) -> (CatalogApi<SlowRepo>, Arc<CatalogRepositoryImpl>) {
    let slow = Arc::new(SlowRepo::new(db_path, read_delay, write_delay));
    let api = CatalogApi::new(slow, Arc::new(FixedClock(test_time())), config);
    let inspect = Arc::new(CatalogRepositoryImpl::new(db_path).expect("failed to create repo"));
    (api, inspect)
}
