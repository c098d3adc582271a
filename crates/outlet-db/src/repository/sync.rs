//! # Sync Outbox Repository
//!
//! Every persisted bill leaves a JSON copy in `sync_outbox`, written inside
//! the bill's own transaction. A forwarder (head office, accounting) drains
//! the queue later; the outlet keeps trading while it is offline.
//!
//! ```text
//! BillRepository::insert
//!     BEGIN
//!       INSERT bills, bill_lines
//!       INSERT sync_outbox ('BILL', invoice_number, <bill JSON>)
//!     COMMIT
//!
//! forwarder
//!     get_pending(n) ──► send ──► mark_synced(id)
//!                          └────► mark_failed(id, error)   attempts += 1
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// A queued copy of one persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SyncOutboxEntry {
    pub id: String,
    /// `BILL` for now.
    pub entity_type: String,
    pub entity_id: String,
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub attempted_at: Option<DateTime<Utc>>,
    pub synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SyncOutboxRepository {
    pool: SqlitePool,
}

impl SyncOutboxRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SyncOutboxRepository { pool }
    }

    /// Queues an entity outside any caller transaction.
    pub async fn queue_for_sync(
        &self,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncOutboxEntry> {
        let mut conn = self.pool.acquire().await?;
        queue_in(&mut *conn, entity_type, entity_id, payload).await
    }

    /// Oldest first, unsynced only.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<SyncOutboxEntry>> {
        let entries = sqlx::query_as::<_, SyncOutboxEntry>(
            r#"
            SELECT id, entity_type, entity_id, payload, attempts, last_error,
                   created_at, attempted_at, synced_at
            FROM sync_outbox
            WHERE synced_at IS NULL
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();
        sqlx::query("UPDATE sync_outbox SET synced_at = ?2, attempted_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox WHERE synced_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

/// Inserts an outbox row on an existing connection or transaction.
pub(crate) async fn queue_in(
    conn: &mut SqliteConnection,
    entity_type: &str,
    entity_id: &str,
    payload: &str,
) -> DbResult<SyncOutboxEntry> {
    let entry = SyncOutboxEntry {
        id: Uuid::new_v4().to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        payload: payload.to_string(),
        attempts: 0,
        last_error: None,
        created_at: Utc::now(),
        attempted_at: None,
        synced_at: None,
    };

    debug!(entity_type = %entity_type, entity_id = %entity_id, "Queuing for sync");

    sqlx::query(
        r#"
        INSERT INTO sync_outbox (
            id, entity_type, entity_id, payload, attempts,
            last_error, created_at, attempted_at, synced_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.entity_type)
    .bind(&entry.entity_id)
    .bind(&entry.payload)
    .bind(entry.attempts)
    .bind(&entry.last_error)
    .bind(entry.created_at)
    .bind(entry.attempted_at)
    .bind(entry.synced_at)
    .execute(&mut *conn)
    .await?;

    Ok(entry)
}
