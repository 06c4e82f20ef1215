// ==========================================
// Framecraft catalog - catalog repository implementation (rusqlite)
// ==========================================
// Storage layout:
// - wholesaler_catalog rows carry a generation column; readers only see
//   the wholesaler's active generation
// - catalog_state tracks (active_generation, staged_generation,
//   last_updated) per wholesaler
// Replace mode stages rows under active+1, then commit_replace flips the
// pointer and purges old rows in one transaction.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::ProductRecord;
use crate::domain::types::{Category, StockStatus, UnitType};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepoResult, RepositoryError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS wholesaler_catalog (
    wholesaler_id    TEXT    NOT NULL,
    generation       INTEGER NOT NULL,
    product_code     TEXT    NOT NULL,
    product_name     TEXT    NOT NULL,
    category         TEXT    NOT NULL,
    subcategory      TEXT,
    unit_type        TEXT    NOT NULL,
    wholesale_price  REAL    NOT NULL,
    suggested_retail REAL,
    min_quantity     INTEGER NOT NULL DEFAULT 1,
    pack_size        INTEGER NOT NULL DEFAULT 1,
    lead_time        TEXT,
    stock_status     TEXT    NOT NULL,
    PRIMARY KEY (wholesaler_id, generation, product_code)
);

CREATE TABLE IF NOT EXISTS catalog_state (
    wholesaler_id     TEXT PRIMARY KEY,
    active_generation INTEGER NOT NULL DEFAULT 0,
    staged_generation INTEGER,
    last_updated      TEXT
);
"#;

// ==========================================
// CatalogRepositoryImpl
// ==========================================
pub struct CatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepositoryImpl {
    /// Open (or create) the catalog database at `db_path` and ensure the
    /// schema exists.
    pub fn new(db_path: &str) -> RepoResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::ConnectionError(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Active generation for a wholesaler (0 when the wholesaler has
    /// never been written).
    fn active_generation(conn: &Connection, wholesaler_id: &str) -> RepoResult<i64> {
        let active: Option<i64> = conn
            .query_row(
                "SELECT active_generation FROM catalog_state WHERE wholesaler_id = ?1",
                params![wholesaler_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(active.unwrap_or(0))
    }

    fn ensure_state_row(conn: &Connection, wholesaler_id: &str) -> RepoResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO catalog_state (wholesaler_id, active_generation) VALUES (?1, 0)",
            params![wholesaler_id],
        )?;
        Ok(())
    }

    fn insert_batch_tx(
        tx: &Transaction,
        wholesaler_id: &str,
        generation: i64,
        products: &[ProductRecord],
        overwrite: bool,
    ) -> RepoResult<usize> {
        let sql = if overwrite {
            r#"
            INSERT INTO wholesaler_catalog (
                wholesaler_id, generation, product_code, product_name, category,
                subcategory, unit_type, wholesale_price, suggested_retail,
                min_quantity, pack_size, lead_time, stock_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(wholesaler_id, generation, product_code) DO UPDATE SET
                product_name = excluded.product_name,
                category = excluded.category,
                subcategory = excluded.subcategory,
                unit_type = excluded.unit_type,
                wholesale_price = excluded.wholesale_price,
                suggested_retail = excluded.suggested_retail,
                min_quantity = excluded.min_quantity,
                pack_size = excluded.pack_size,
                lead_time = excluded.lead_time,
                stock_status = excluded.stock_status
            "#
        } else {
            r#"
            INSERT INTO wholesaler_catalog (
                wholesaler_id, generation, product_code, product_name, category,
                subcategory, unit_type, wholesale_price, suggested_retail,
                min_quantity, pack_size, lead_time, stock_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#
        };

        let mut stmt = tx.prepare(sql)?;
        let mut count = 0;
        for product in products {
            stmt.execute(params![
                wholesaler_id,
                generation,
                product.product_code,
                product.product_name,
                product.category.as_str(),
                product.subcategory,
                product.unit_type.as_str(),
                product.wholesale_price,
                product.suggested_retail,
                product.min_quantity,
                product.pack_size,
                product.lead_time,
                product.stock_status.as_str(),
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn row_to_product(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
        let category_raw: String = row.get("category")?;
        let unit_type_raw: String = row.get("unit_type")?;
        let stock_status_raw: String = row.get("stock_status")?;

        Ok(ProductRecord {
            product_code: row.get("product_code")?,
            product_name: row.get("product_name")?,
            category: parse_enum_column(2, &category_raw, Category::parse_token)?,
            subcategory: row.get("subcategory")?,
            unit_type: parse_enum_column(4, &unit_type_raw, UnitType::parse_token)?,
            wholesale_price: row.get("wholesale_price")?,
            suggested_retail: row.get("suggested_retail")?,
            min_quantity: row.get("min_quantity")?,
            pack_size: row.get("pack_size")?,
            lead_time: row.get("lead_time")?,
            stock_status: parse_enum_column(10, &stock_status_raw, StockStatus::parse_token)?,
        })
    }
}

/// Map a stored enum token back to its type; a token this code never
/// wrote means the database was edited out-of-band.
fn parse_enum_column<T>(
    idx: usize,
    raw: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown enum token in catalog row: {raw}").into(),
        )
    })
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn fetch_catalog(&self, wholesaler_id: &str) -> RepoResult<Vec<ProductRecord>> {
        let conn = self.lock()?;
        let generation = Self::active_generation(&conn, wholesaler_id)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT product_code, product_name, category, subcategory, unit_type,
                   wholesale_price, suggested_retail, min_quantity, pack_size,
                   lead_time, stock_status
            FROM wholesaler_catalog
            WHERE wholesaler_id = ?1 AND generation = ?2
            ORDER BY product_code
            "#,
        )?;

        let rows = stmt
            .query_map(params![wholesaler_id, generation], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    async fn count_products(&self, wholesaler_id: &str) -> RepoResult<usize> {
        let conn = self.lock()?;
        let generation = Self::active_generation(&conn, wholesaler_id)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM wholesaler_catalog WHERE wholesaler_id = ?1 AND generation = ?2",
            params![wholesaler_id, generation],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    async fn last_updated(&self, wholesaler_id: &str) -> RepoResult<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let ts: Option<Option<DateTime<Utc>>> = conn
            .query_row(
                "SELECT last_updated FROM catalog_state WHERE wholesaler_id = ?1",
                params![wholesaler_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts.flatten())
    }

    async fn insert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        let mut conn = self.lock()?;
        Self::ensure_state_row(&conn, wholesaler_id)?;
        let generation = Self::active_generation(&conn, wholesaler_id)?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        let count = Self::insert_batch_tx(&tx, wholesaler_id, generation, products, false)?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, count, "insert batch committed");
        Ok(count)
    }

    async fn upsert_products(
        &self,
        wholesaler_id: &str,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        let mut conn = self.lock()?;
        Self::ensure_state_row(&conn, wholesaler_id)?;
        let generation = Self::active_generation(&conn, wholesaler_id)?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        let count = Self::insert_batch_tx(&tx, wholesaler_id, generation, products, true)?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, count, "upsert batch committed");
        Ok(count)
    }

    async fn begin_replace(&self, wholesaler_id: &str) -> RepoResult<i64> {
        let mut conn = self.lock()?;
        Self::ensure_state_row(&conn, wholesaler_id)?;
        let active = Self::active_generation(&conn, wholesaler_id)?;
        let staged = active + 1;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        // drop stale staged rows from a crashed job
        tx.execute(
            "DELETE FROM wholesaler_catalog WHERE wholesaler_id = ?1 AND generation != ?2",
            params![wholesaler_id, active],
        )?;
        tx.execute(
            "UPDATE catalog_state SET staged_generation = ?2 WHERE wholesaler_id = ?1",
            params![wholesaler_id, staged],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, staged, "replace staging opened");
        Ok(staged)
    }

    async fn stage_replace_batch(
        &self,
        wholesaler_id: &str,
        generation: i64,
        products: &[ProductRecord],
    ) -> RepoResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        let count = Self::insert_batch_tx(&tx, wholesaler_id, generation, products, false)?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn commit_replace(
        &self,
        wholesaler_id: &str,
        generation: i64,
        committed_at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        let mut conn = self.lock()?;

        let staged: Option<i64> = conn
            .query_row(
                "SELECT staged_generation FROM catalog_state WHERE wholesaler_id = ?1",
                params![wholesaler_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        if staged != Some(generation) {
            return Err(RepositoryError::NoStagedGeneration(
                wholesaler_id.to_string(),
            ));
        }

        // The swap: purge every older generation and flip the pointer in
        // one transaction, so readers see old rows or new rows, never a
        // mixture.
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        tx.execute(
            "DELETE FROM wholesaler_catalog WHERE wholesaler_id = ?1 AND generation != ?2",
            params![wholesaler_id, generation],
        )?;
        tx.execute(
            r#"
            UPDATE catalog_state
            SET active_generation = ?2, staged_generation = NULL, last_updated = ?3
            WHERE wholesaler_id = ?1
            "#,
            params![wholesaler_id, generation, committed_at],
        )?;
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM wholesaler_catalog WHERE wholesaler_id = ?1 AND generation = ?2",
            params![wholesaler_id, generation],
            |row| row.get(0),
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, generation, count, "replace committed");
        Ok(count as usize)
    }

    async fn abort_replace(&self, wholesaler_id: &str, generation: i64) -> RepoResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        tx.execute(
            "DELETE FROM wholesaler_catalog WHERE wholesaler_id = ?1 AND generation = ?2",
            params![wholesaler_id, generation],
        )?;
        tx.execute(
            "UPDATE catalog_state SET staged_generation = NULL WHERE wholesaler_id = ?1",
            params![wholesaler_id],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, generation, "replace staging aborted");
        Ok(())
    }

    async fn clear_catalog(
        &self,
        wholesaler_id: &str,
        cleared_at: DateTime<Utc>,
    ) -> RepoResult<usize> {
        let mut conn = self.lock()?;
        Self::ensure_state_row(&conn, wholesaler_id)?;

        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        let deleted = tx.execute(
            "DELETE FROM wholesaler_catalog WHERE wholesaler_id = ?1",
            params![wholesaler_id],
        )?;
        tx.execute(
            "UPDATE catalog_state SET last_updated = ?2, staged_generation = NULL WHERE wholesaler_id = ?1",
            params![wholesaler_id, cleared_at],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;

        debug!(wholesaler_id, deleted, "catalog cleared");
        Ok(deleted)
    }

    async fn touch_last_updated(&self, wholesaler_id: &str, at: DateTime<Utc>) -> RepoResult<()> {
        let conn = self.lock()?;
        Self::ensure_state_row(&conn, wholesaler_id)?;
        conn.execute(
            "UPDATE catalog_state SET last_updated = ?2 WHERE wholesaler_id = ?1",
            params![wholesaler_id, at],
        )?;
        Ok(())
    }
}
