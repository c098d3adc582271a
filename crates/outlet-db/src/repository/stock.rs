//! # Stock Repository
//!
//! Durable copy of the two inventory pools. Rows carry the channel whose
//! pool they belong to; a batch never appears in both. Rows are never
//! deleted: an exhausted batch stays with `current_quantity = 0`.
//!
//! ```text
//! load(COUNTER)  ──► SELECT ... WHERE channel = 'COUNTER'
//! upsert_all(ONLINE, batches)
//!     BEGIN
//!       INSERT each batch
//!         ON CONFLICT (id) DO UPDATE SET current_quantity = ...
//!     COMMIT
//! ```
//!
//! A batch inserted after a ledger loaded the pool is not in that ledger's
//! snapshot, so its row is left as it is by the ledger's next save.

use chrono::NaiveDate;
use outlet_core::{Channel, StockBatch};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct StockBatchRow {
    id: String,
    item_code: String,
    item_name: String,
    original_quantity: i64,
    current_quantity: i64,
    purchase_date: NaiveDate,
    expiry_date: NaiveDate,
}

impl From<StockBatchRow> for StockBatch {
    fn from(row: StockBatchRow) -> Self {
        StockBatch {
            id: row.id,
            item_code: row.item_code,
            item_name: row.item_name,
            original_quantity: row.original_quantity,
            current_quantity: row.current_quantity,
            purchase_date: row.purchase_date,
            expiry_date: row.expiry_date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    pub async fn load(&self, channel: Channel) -> DbResult<Vec<StockBatch>> {
        let rows = sqlx::query_as::<_, StockBatchRow>(
            r#"
            SELECT id, item_code, item_name, original_quantity, current_quantity,
                   purchase_date, expiry_date
            FROM stock_batches
            WHERE channel = ?1
            ORDER BY item_code, purchase_date, id
            "#,
        )
        .bind(channel.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StockBatch::from).collect())
    }

    /// Adds one batch to a pool.
    pub async fn insert(&self, channel: Channel, batch: &StockBatch) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_batch(&mut *conn, channel, batch).await
    }

    /// Writes every batch by id in one transaction. Known batches get their
    /// current quantity updated, new ones are inserted, and rows not in
    /// `batches` are left alone.
    pub async fn upsert_all(&self, channel: Channel, batches: &[StockBatch]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        for batch in batches {
            sqlx::query(
                r#"
                INSERT INTO stock_batches (
                    id, channel, item_code, item_name, original_quantity,
                    current_quantity, purchase_date, expiry_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT (id) DO UPDATE SET
                    current_quantity = excluded.current_quantity
                WHERE stock_batches.channel = excluded.channel
                "#,
            )
            .bind(&batch.id)
            .bind(channel.as_str())
            .bind(&batch.item_code)
            .bind(&batch.item_name)
            .bind(batch.original_quantity)
            .bind(batch.current_quantity)
            .bind(batch.purchase_date)
            .bind(batch.expiry_date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(channel = %channel, batches = batches.len(), "Stock pool saved");
        Ok(())
    }

    /// Σ current quantity for one item in one pool.
    pub async fn available(&self, channel: Channel, item_code: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(current_quantity), 0)
            FROM stock_batches
            WHERE channel = ?1 AND item_code = ?2 AND current_quantity > 0
            "#,
        )
        .bind(channel.as_str())
        .bind(item_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

async fn insert_batch(
    conn: &mut SqliteConnection,
    channel: Channel,
    batch: &StockBatch,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_batches (
            id, channel, item_code, item_name, original_quantity,
            current_quantity, purchase_date, expiry_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&batch.id)
    .bind(channel.as_str())
    .bind(&batch.item_code)
    .bind(&batch.item_name)
    .bind(batch.original_quantity)
    .bind(batch.current_quantity)
    .bind(batch.purchase_date)
    .bind(batch.expiry_date)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
