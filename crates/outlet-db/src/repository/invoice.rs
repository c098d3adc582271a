//! # Invoice Repository
//!
//! The invoice serial lives in a single row so that every process sharing
//! the database draws from the same sequence.

use sqlx::SqlitePool;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Increments and returns the serial in one statement.
    pub async fn next_serial(&self) -> DbResult<i64> {
        let serial: i64 = sqlx::query_scalar(
            "UPDATE invoice_sequence SET last_value = last_value + 1 WHERE id = 1 RETURNING last_value",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(serial)
    }

    pub async fn last_serial(&self) -> DbResult<i64> {
        let serial: i64 =
            sqlx::query_scalar("SELECT last_value FROM invoice_sequence WHERE id = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(serial)
    }
}
