//! # Item Repository
//!
//! Catalog reads and writes. The sale path only ever calls [`ItemRepository::get`].

use outlet_core::{Item, Money};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    code: String,
    name: String,
    price_cents: i64,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item::new(row.code, row.name, Money::from_cents(row.price_cents))
    }
}

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn get(&self, code: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT code, name, price_cents FROM items WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Item::from))
    }

    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT code, name, price_cents FROM items ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Inserts or updates by code. Bills already written keep their prices.
    pub async fn upsert(&self, item: &Item) -> DbResult<()> {
        debug!(code = %item.code, price = %item.price, "Upserting item");

        sqlx::query(
            r#"
            INSERT INTO items (code, name, price_cents) VALUES (?1, ?2, ?3)
            ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents
            "#,
        )
        .bind(&item.code)
        .bind(&item.name)
        .bind(item.price.cents())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
