//! # SQLite Backend
//!
//! Implements the outlet-core collaborator traits on top of [`Database`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleFacade (sync)                                                      │
//! │       │  ItemCatalog / InvoiceSequence / BillStore / StockStore         │
//! │       ▼                                                                 │
//! │  SqliteBackend ── block_on ──► repositories (async sqlx) ──► SQLite    │
//! │       │                                                                 │
//! │       └── owns a current-thread tokio runtime                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core is synchronous, so the backend carries its own runtime. Calling
//! it from inside another tokio runtime panics; async callers should use the
//! repositories on [`SqliteBackend::database`] directly.

use std::future::Future;

use chrono::NaiveDate;
use outlet_core::collaborators::{BillStore, InvoiceSequence, ItemCatalog, StockStore};
use outlet_core::{Bill, Channel, Item, OutletConfig, SaleResult, StockBatch};
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::pool::{Database, DbConfig};

pub struct SqliteBackend {
    db: Database,
    runtime: Runtime,
    invoice_prefix: String,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("db", &self.db)
            .field("invoice_prefix", &self.invoice_prefix)
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens the database (running migrations when enabled).
    pub fn open(config: DbConfig, outlet: &OutletConfig) -> DbResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbError::Internal(format!("failed to start runtime: {e}")))?;

        let db = runtime.block_on(Database::new(config))?;
        info!(prefix = %outlet.invoice_prefix, "SQLite backend ready");

        Ok(SqliteBackend {
            db,
            runtime,
            invoice_prefix: outlet.invoice_prefix.clone(),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn block<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn upsert_item(&self, item: &Item) -> DbResult<()> {
        self.block(self.db.items().upsert(item))
    }

    /// Appends a batch to the stored pool.
    ///
    /// A ledger already open on that pool does not see the batch until it
    /// is reopened or restocked itself; its saves leave the new row intact.
    pub fn restock(&self, channel: Channel, batch: &StockBatch) -> DbResult<()> {
        self.block(self.db.stock().insert(channel, batch))
    }

    pub fn bills_on(&self, date: NaiveDate) -> DbResult<Vec<Bill>> {
        self.block(self.db.bills().list_on(date))
    }

    pub fn bills_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Bill>> {
        self.block(self.db.bills().list_between(from, to))
    }

    pub fn all_bills(&self) -> DbResult<Vec<Bill>> {
        self.block(self.db.bills().list())
    }

    pub fn pending_sync(&self) -> DbResult<i64> {
        self.block(self.db.sync_outbox().count_pending())
    }
}

impl ItemCatalog for SqliteBackend {
    fn lookup(&self, code: &str) -> SaleResult<Item> {
        self.block(self.db.items().get(code))?
            .ok_or_else(|| DbError::not_found("Item", code).into())
    }
}

impl InvoiceSequence for SqliteBackend {
    fn next(&self) -> SaleResult<String> {
        let serial = self.block(self.db.invoices().next_serial())?;
        Ok(format!("{}{}", self.invoice_prefix, serial))
    }
}

impl BillStore for SqliteBackend {
    fn persist(&self, bill: &Bill) -> SaleResult<()> {
        Ok(self.block(self.db.bills().insert(bill))?)
    }
}

impl StockStore for SqliteBackend {
    fn load(&self, channel: Channel) -> SaleResult<Vec<StockBatch>> {
        Ok(self.block(self.db.stock().load(channel))?)
    }

    fn save(&self, channel: Channel, batches: &[StockBatch]) -> SaleResult<()> {
        Ok(self.block(self.db.stock().upsert_all(channel, batches))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use outlet_core::facade::{open_ledger, transfer_stock, Collaborators, SaleFacade};
    use outlet_core::report::bill_transactions;
    use outlet_core::{Money, SaleError};
    use std::sync::Arc;

    fn backend(prefix: &str) -> SqliteBackend {
        let config = OutletConfig {
            invoice_prefix: prefix.to_string(),
            ..OutletConfig::default()
        };
        SqliteBackend::open(DbConfig::in_memory(), &config).unwrap()
    }

    #[test]
    fn test_lookup_miss_is_item_not_found() {
        let backend = backend("");
        assert_eq!(
            backend.lookup("ITEM404").unwrap_err(),
            SaleError::ItemNotFound("ITEM404".to_string())
        );

        backend
            .upsert_item(&Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599)))
            .unwrap();
        assert_eq!(backend.lookup("ITEM001").unwrap().price.cents(), 1599);
    }

    #[test]
    fn test_invoice_numbers_carry_prefix() {
        let backend = backend("INV-");
        assert_eq!(backend.next().unwrap(), "INV-1");
        assert_eq!(backend.next().unwrap(), "INV-2");
    }

    fn stocked_backend() -> (Arc<SqliteBackend>, OutletConfig) {
        let config = OutletConfig::default();
        let backend = SqliteBackend::open(DbConfig::in_memory(), &config).unwrap();
        let rice = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let tea = Item::new("ITEM002", "Tea 500g", Money::from_cents(2000));
        let today = Utc::now().date_naive();
        for item in [&rice, &tea] {
            backend.upsert_item(item).unwrap();
            for channel in [Channel::Counter, Channel::Online] {
                let batch = StockBatch::new(item, 10, today, today + Duration::days(90));
                backend.restock(channel, &batch).unwrap();
            }
        }
        (Arc::new(backend), config)
    }

    fn pool_total(backend: &SqliteBackend, channel: Channel, code: &str) -> i64 {
        backend
            .load(channel)
            .unwrap()
            .iter()
            .filter(|b| b.item_code == code)
            .map(|b| b.current_quantity)
            .sum()
    }

    #[test]
    fn test_counter_and_online_sales_persist_end_to_end() {
        let (backend, config) = stocked_backend();
        let collaborators = Collaborators::shared(backend.clone());

        let counter_ledger =
            Arc::new(open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap());
        let mut counter =
            SaleFacade::counter(counter_ledger, collaborators.clone(), &config).unwrap();
        counter.start(Channel::Counter).unwrap();
        counter.add_item("ITEM001", 2).unwrap();
        let receipt = counter.complete_sale(Money::from_cents(5000)).unwrap();
        assert_eq!(receipt.bill.invoice_number(), "1");
        assert_eq!(receipt.bill.change().cents(), 1802);

        let online_ledger =
            Arc::new(open_ledger(backend.as_ref(), Channel::Online, &config).unwrap());
        let mut online = SaleFacade::online(online_ledger, collaborators, &config).unwrap();
        online.start(Channel::Online).unwrap();
        online.add_item("ITEM002", 1).unwrap();
        let receipt = online.complete_sale(Money::zero()).unwrap();
        assert_eq!(receipt.bill.invoice_number(), "2");
        assert_eq!(receipt.shipping_fee.cents(), 599);
        assert_eq!(receipt.grand_total.cents(), 2599);

        assert_eq!(pool_total(&backend, Channel::Counter, "ITEM001"), 8);
        assert_eq!(pool_total(&backend, Channel::Online, "ITEM001"), 10);
        assert_eq!(pool_total(&backend, Channel::Online, "ITEM002"), 9);

        let today = Utc::now().date_naive();
        let bills = backend.bills_on(today).unwrap();
        assert_eq!(bills.len(), 2);

        let period = backend.bills_between(today, today).unwrap();
        let report = bill_transactions(&period, today, today, &config);
        assert_eq!(report.transaction_count, 2);
        assert_eq!(
            report.total_amount,
            bills.iter().map(Bill::total).sum::<Money>()
        );
        assert_eq!(backend.all_bills().unwrap().len(), 2);
        assert_eq!(backend.pending_sync().unwrap(), 2);
    }

    #[test]
    fn test_reopened_ledger_sees_saved_stock() {
        let (backend, config) = stocked_backend();
        let ledger = Arc::new(open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap());
        let mut counter =
            SaleFacade::counter(ledger, Collaborators::shared(backend.clone()), &config).unwrap();

        counter
            .quick_sale("ITEM002", 4, None, Money::from_cents(10_000))
            .unwrap();

        let reopened = open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap();
        assert_eq!(reopened.available_quantity("ITEM002"), 6);
        assert_eq!(reopened.available_quantity("ITEM001"), 10);
    }

    #[test]
    fn test_stock_received_after_open_survives_next_sale() {
        let (backend, config) = stocked_backend();
        let ledger = Arc::new(open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap());
        let mut counter =
            SaleFacade::counter(ledger, Collaborators::shared(backend.clone()), &config).unwrap();

        let sugar = Item::new("ITEM003", "Sugar 1kg", Money::from_cents(899));
        backend.upsert_item(&sugar).unwrap();
        let today = Utc::now().date_naive();
        backend
            .restock(
                Channel::Counter,
                &StockBatch::new(&sugar, 25, today, today + Duration::days(60)),
            )
            .unwrap();

        counter
            .quick_sale("ITEM001", 1, None, Money::from_cents(2000))
            .unwrap();

        assert_eq!(pool_total(&backend, Channel::Counter, "ITEM003"), 25);
        assert_eq!(pool_total(&backend, Channel::Counter, "ITEM001"), 9);
        let reopened = open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap();
        assert_eq!(reopened.available_quantity("ITEM003"), 25);
    }

    #[test]
    fn test_store_to_website_transfer_persists_both_pools() {
        let (backend, config) = stocked_backend();
        let store = open_ledger(backend.as_ref(), Channel::Counter, &config).unwrap();
        let website = open_ledger(backend.as_ref(), Channel::Online, &config).unwrap();

        let moved = transfer_stock(&store, &website, backend.as_ref(), "ITEM001", 6).unwrap();
        assert_eq!(moved.iter().map(|b| b.current_quantity).sum::<i64>(), 6);

        assert_eq!(pool_total(&backend, Channel::Counter, "ITEM001"), 4);
        assert_eq!(pool_total(&backend, Channel::Online, "ITEM001"), 16);
        assert_eq!(pool_total(&backend, Channel::Online, "ITEM002"), 10);
    }
}
