//! # Collaborator Contracts
//!
//! The four external services a sale depends on, and in-memory versions of
//! each for tests, demos, and single-process deployments.
//!
//! ## Boundaries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SaleFacade                                    │
//! │                                                                         │
//! │   ItemCatalog ──── lookup(code) ─────────► Item | ItemNotFound         │
//! │   InvoiceSequence ─ next() ──────────────► "1", "2", ...               │
//! │   BillStore ─────── persist(&Bill) ──────► () | Persistence            │
//! │   StockStore ────── load(channel) / save(channel, batches)             │
//! │                                                                         │
//! │   In-memory (this file)          SQLite (outlet-db::SqliteBackend)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All calls are blocking. Implementations must be shareable across the
//! threads that run concurrent checkouts, hence the `Send + Sync` bounds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use crate::error::{SaleError, SaleResult};
use crate::types::{Bill, Channel, Item, StockBatch};

// =============================================================================
// Contracts
// =============================================================================

/// Resolves item codes to catalog items.
pub trait ItemCatalog: Send + Sync {
    /// Returns [`SaleError::ItemNotFound`] when the code is unknown.
    fn lookup(&self, code: &str) -> SaleResult<Item>;
}

/// Hands out invoice numbers. No value is ever returned twice.
pub trait InvoiceSequence: Send + Sync {
    fn next(&self) -> SaleResult<String>;
}

/// Durable home for committed bills.
pub trait BillStore: Send + Sync {
    fn persist(&self, bill: &Bill) -> SaleResult<()>;
}

/// Durable backing for an inventory pool.
pub trait StockStore: Send + Sync {
    fn load(&self, channel: Channel) -> SaleResult<Vec<StockBatch>>;

    /// Writes `batches` into the stored pool for `channel`, matched by batch
    /// id. Stored batches missing from `batches` are left untouched.
    fn save(&self, channel: Channel, batches: &[StockBatch]) -> SaleResult<()>;
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<String, Item>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Adds or replaces an item. Lines already in a cart keep their old price.
    pub fn insert(&self, item: Item) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(item.code.clone(), item);
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemCatalog for InMemoryCatalog {
    fn lookup(&self, code: &str) -> SaleResult<Item> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
            .ok_or_else(|| SaleError::ItemNotFound(code.to_string()))
    }
}

// =============================================================================
// Serial Invoice Sequence
// =============================================================================

/// `prefix` followed by 1, 2, 3, ...
#[derive(Debug)]
pub struct SerialInvoiceSequence {
    prefix: String,
    last: AtomicU64,
}

impl SerialInvoiceSequence {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_after(prefix, 0)
    }

    /// Resumes a sequence whose last issued serial was `last`.
    pub fn starting_after(prefix: impl Into<String>, last: u64) -> Self {
        SerialInvoiceSequence {
            prefix: prefix.into(),
            last: AtomicU64::new(last),
        }
    }
}

impl InvoiceSequence for SerialInvoiceSequence {
    fn next(&self) -> SaleResult<String> {
        let serial = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}{}", self.prefix, serial))
    }
}

// =============================================================================
// In-Memory Bill Store
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryBillStore {
    bills: Mutex<Vec<Bill>>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All persisted bills in persist order.
    pub fn bills(&self) -> Vec<Bill> {
        self.bills.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl BillStore for InMemoryBillStore {
    fn persist(&self, bill: &Bill) -> SaleResult<()> {
        let mut bills = self.bills.lock().unwrap_or_else(PoisonError::into_inner);
        if bills
            .iter()
            .any(|b| b.invoice_number() == bill.invoice_number())
        {
            return Err(SaleError::Persistence(format!(
                "duplicate invoice number {}",
                bill.invoice_number()
            )));
        }
        bills.push(bill.clone());
        Ok(())
    }
}

// =============================================================================
// In-Memory Stock Store
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    pools: Mutex<HashMap<Channel, Vec<StockBatch>>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn load(&self, channel: Channel) -> SaleResult<Vec<StockBatch>> {
        let pools = self.pools.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pools.get(&channel).cloned().unwrap_or_default())
    }

    fn save(&self, channel: Channel, batches: &[StockBatch]) -> SaleResult<()> {
        let mut pools = self.pools.lock().unwrap_or_else(PoisonError::into_inner);
        let pool = pools.entry(channel).or_default();
        for batch in batches {
            match pool.iter_mut().find(|stored| stored.id == batch.id) {
                Some(stored) => *stored = batch.clone(),
                None => pool.push(batch.clone()),
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::BillParts;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_catalog_lookup() {
        let catalog = InMemoryCatalog::with_items([Item::new(
            "ITEM001",
            "Rice 1kg",
            Money::from_cents(1599),
        )]);

        assert_eq!(catalog.lookup("ITEM001").unwrap().name, "Rice 1kg");
        assert_eq!(
            catalog.lookup("NOPE"),
            Err(SaleError::ItemNotFound("NOPE".to_string()))
        );
    }

    #[test]
    fn test_invoice_sequence_is_monotonic() {
        let seq = SerialInvoiceSequence::new("");
        assert_eq!(seq.next().unwrap(), "1");
        assert_eq!(seq.next().unwrap(), "2");

        let resumed = SerialInvoiceSequence::starting_after("INV-", 41);
        assert_eq!(resumed.next().unwrap(), "INV-42");
    }

    #[test]
    fn test_invoice_sequence_never_repeats_across_threads() {
        let seq = Arc::new(SerialInvoiceSequence::new(""));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || (0..100).map(|_| seq.next().unwrap()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "invoice number issued twice");
            }
        }
        assert_eq!(seen.len(), 800);
    }

    #[test]
    fn test_bill_store_rejects_duplicate_invoice() {
        let store = InMemoryBillStore::new();
        let bill = Bill::restore(BillParts {
            invoice_number: "1".to_string(),
            channel: Channel::Counter,
            lines: vec![],
            subtotal: Money::zero(),
            discount: Money::zero(),
            total: Money::zero(),
            shipping_fee: Money::zero(),
            cash_tendered: Money::from_cents(100),
            change: Money::from_cents(100),
            created_at: Utc::now(),
        });

        store.persist(&bill).unwrap();
        assert!(matches!(
            store.persist(&bill),
            Err(SaleError::Persistence(_))
        ));
        assert_eq!(store.bills().len(), 1);
    }

    #[test]
    fn test_stock_store_keeps_pools_apart() {
        let store = InMemoryStockStore::new();
        let item = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let batch = StockBatch::new(&item, 10, d, d);

        store.save(Channel::Counter, &[batch.clone()]).unwrap();

        assert_eq!(store.load(Channel::Counter).unwrap(), vec![batch]);
        assert!(store.load(Channel::Online).unwrap().is_empty());
    }

    #[test]
    fn test_stock_save_updates_by_id_and_keeps_unknown_batches() {
        let store = InMemoryStockStore::new();
        let item = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut sold = StockBatch::new(&item, 10, d, d);
        let received_later = StockBatch::new(&item, 25, d, d);

        store.save(Channel::Counter, &[sold.clone()]).unwrap();
        store.save(Channel::Counter, &[received_later.clone()]).unwrap();
        sold.current_quantity = 4;
        store.save(Channel::Counter, &[sold.clone()]).unwrap();

        assert_eq!(store.load(Channel::Counter).unwrap(), vec![sold, received_later]);
    }
}
