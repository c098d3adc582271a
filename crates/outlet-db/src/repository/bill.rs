//! # Bill Repository
//!
//! Bills are written once and never updated.
//!
//! ## Insert
//! ```text
//! BEGIN
//!   INSERT INTO bills        (header, money columns in cents)
//!   INSERT INTO bill_lines   (one row per line, position keeps cart order)
//!   INSERT INTO sync_outbox  ('BILL', invoice_number, JSON)
//! COMMIT
//! ```
//!
//! A reused invoice number fails on the `bills` primary key and rolls the
//! whole transaction back.

use chrono::{DateTime, NaiveDate, Utc};
use outlet_core::{Bill, BillParts, Channel, LineItem, Money};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::sync;

pub const BILL_ENTITY: &str = "BILL";

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    invoice_number: String,
    channel: String,
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    shipping_cents: i64,
    cash_tendered_cents: i64,
    change_cents: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct BillLineRow {
    item_code: String,
    item_name: String,
    unit_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
}

impl From<BillLineRow> for LineItem {
    fn from(row: BillLineRow) -> Self {
        LineItem {
            item_code: row.item_code,
            item_name: row.item_name,
            unit_price: Money::from_cents(row.unit_price_cents),
            quantity: row.quantity,
            line_total: Money::from_cents(row.line_total_cents),
        }
    }
}

const BILL_COLUMNS: &str = r#"
    SELECT invoice_number, channel, subtotal_cents, discount_cents, total_cents,
           shipping_cents, cash_tendered_cents, change_cents, created_at
    FROM bills
"#;

#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Writes the bill, its lines and an outbox entry atomically.
    pub async fn insert(&self, bill: &Bill) -> DbResult<()> {
        let payload = serde_json::to_string(bill)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO bills (
                invoice_number, channel, store_type, subtotal_cents, discount_cents,
                total_cents, shipping_cents, cash_tendered_cents, change_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(bill.invoice_number())
        .bind(bill.channel().as_str())
        .bind(bill.store_type().as_str())
        .bind(bill.subtotal().cents())
        .bind(bill.discount().cents())
        .bind(bill.total().cents())
        .bind(bill.shipping_fee().cents())
        .bind(bill.cash_tendered().cents())
        .bind(bill.change().cents())
        .bind(bill.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: bill.invoice_number().to_string(),
            },
            other => other,
        })?;

        for (position, line) in bill.lines().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bill_lines (
                    invoice_number, position, item_code, item_name,
                    unit_price_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(bill.invoice_number())
            .bind(position as i64)
            .bind(&line.item_code)
            .bind(&line.item_name)
            .bind(line.unit_price.cents())
            .bind(line.quantity)
            .bind(line.line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        sync::queue_in(&mut *tx, BILL_ENTITY, bill.invoice_number(), &payload).await?;

        tx.commit().await?;
        info!(
            invoice = %bill.invoice_number(),
            channel = %bill.channel(),
            total = %bill.total(),
            "Bill persisted"
        );
        Ok(())
    }

    pub async fn get(&self, invoice_number: &str) -> DbResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(&format!(
            "{BILL_COLUMNS} WHERE invoice_number = ?1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.restore(row).await?)),
            None => Ok(None),
        }
    }

    /// All bills, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{BILL_COLUMNS} ORDER BY created_at, invoice_number"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.restore_all(rows).await
    }

    /// Bills whose UTC creation date is `date`.
    pub async fn list_on(&self, date: NaiveDate) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{BILL_COLUMNS} WHERE substr(created_at, 1, 10) = ?1 ORDER BY created_at, invoice_number"
        ))
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        debug!(date = %date, bills = rows.len(), "Loaded bills for day");
        self.restore_all(rows).await
    }

    /// Bills whose UTC creation date falls in `from..=to`, newest first.
    pub async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{BILL_COLUMNS} WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2 \
             ORDER BY created_at DESC, invoice_number DESC"
        ))
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        debug!(from = %from, to = %to, bills = rows.len(), "Loaded bills for period");
        self.restore_all(rows).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn restore_all(&self, rows: Vec<BillRow>) -> DbResult<Vec<Bill>> {
        let mut bills = Vec::with_capacity(rows.len());
        for row in rows {
            bills.push(self.restore(row).await?);
        }
        Ok(bills)
    }

    async fn restore(&self, row: BillRow) -> DbResult<Bill> {
        let channel: Channel = row
            .channel
            .parse()
            .map_err(|e| DbError::corrupt("bills", e))?;

        let lines = sqlx::query_as::<_, BillLineRow>(
            r#"
            SELECT item_code, item_name, unit_price_cents, quantity, line_total_cents
            FROM bill_lines
            WHERE invoice_number = ?1
            ORDER BY position
            "#,
        )
        .bind(&row.invoice_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(Bill::restore(BillParts {
            invoice_number: row.invoice_number,
            channel,
            lines: lines.into_iter().map(LineItem::from).collect(),
            subtotal: Money::from_cents(row.subtotal_cents),
            discount: Money::from_cents(row.discount_cents),
            total: Money::from_cents(row.total_cents),
            shipping_fee: Money::from_cents(row.shipping_cents),
            cash_tendered: Money::from_cents(row.cash_tendered_cents),
            change: Money::from_cents(row.change_cents),
            created_at: row.created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use outlet_core::Item;

    fn bill(invoice: &str, channel: Channel) -> Bill {
        let rice = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let tea = Item::new("ITEM002", "Tea 500g", Money::from_cents(2000));
        let lines = vec![LineItem::from_item(&rice, 2), LineItem::from_item(&tea, 1)];
        Bill::restore(BillParts {
            invoice_number: invoice.to_string(),
            channel,
            lines,
            subtotal: Money::from_cents(5198),
            discount: Money::from_cents(198),
            total: Money::from_cents(5000),
            shipping_fee: Money::zero(),
            cash_tendered: Money::from_cents(6000),
            change: Money::from_cents(1000),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 10, 30, 0).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_insert_and_get_preserves_lines_in_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bills();
        let original = bill("1", Channel::Counter);

        repo.insert(&original).await.unwrap();

        let loaded = repo.get("1").await.unwrap().unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.lines()[0].item_code, "ITEM001");
        assert_eq!(db.sync_outbox().count_pending().await.unwrap(), 1);
        assert!(repo.get("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_invoice_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bills();

        repo.insert(&bill("1", Channel::Counter)).await.unwrap();
        let err = repo.insert(&bill("1", Channel::Online)).await.unwrap_err();

        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "1"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(db.sync_outbox().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_on_filters_by_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bills();
        repo.insert(&bill("1", Channel::Counter)).await.unwrap();
        repo.insert(&bill("2", Channel::Online)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(repo.list_on(day).await.unwrap().len(), 2);
        assert!(repo.list_on(day.succ_opt().unwrap()).await.unwrap().is_empty());
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_between_is_inclusive_and_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.bills();
        repo.insert(&bill("1", Channel::Counter)).await.unwrap();
        repo.insert(&bill("2", Channel::Online)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let bills = repo.list_between(day, day).await.unwrap();
        let numbers: Vec<&str> = bills.iter().map(Bill::invoice_number).collect();
        assert_eq!(numbers, vec!["2", "1"]);

        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(repo.list_between(start, day).await.unwrap().len(), 2);

        let later = day.succ_opt().unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert!(repo.list_between(later, end).await.unwrap().is_empty());
        assert!(repo.list_between(day, start).await.unwrap().is_empty());
    }
}
