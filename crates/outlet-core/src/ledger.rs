//! # Inventory Ledger
//!
//! One pool of stock batches (STORE or WEBSITE), keyed by item code.
//!
//! ## Allocation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sort key per available batch:                                         │
//! │                                                                         │
//! │    1. urgency bucket   expiring within the window (30 days) first      │
//! │    2. expiry date      ascending                                       │
//! │    3. purchase date    ascending                                       │
//! │                                                                         │
//! │  ITEM001: [5 @ +2d] [10 @ +30d]    allocate 7                          │
//! │            ──────    ───────                                            │
//! │            take 5    take 2        ──►  [0 @ +2d] [8 @ +30d]           │
//! │            (exhausted, kept)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! The availability check and the deduction run under one mutex for the
//! whole pool. Either every requested quantity is deducted or nothing is.
//! [`InventoryLedger::commit_sale`] widens the same critical section to
//! include the caller's payment and bill step.
//!
//! [`InventoryLedger::has_stock`] takes the lock only to read; its answer
//! may be stale by the time a sale completes.
//!
//! Saves go through [`InventoryLedger::persist_to`], which holds a second
//! mutex across snapshot and write. Facades sharing one ledger therefore
//! write snapshots to the store in the order they were taken, and a
//! stale snapshot never lands after a newer one.
//!
//! Pool/channel binding is not checked here. Facades check it with
//! [`crate::policy::can_access_pool`]. The one exception is
//! [`InventoryLedger::transfer_to`], which only moves STORE stock into the
//! WEBSITE pool.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collaborators::StockStore;
use crate::config::DEFAULT_URGENCY_WINDOW_DAYS;
use crate::error::{SaleError, SaleResult};
use crate::policy;
use crate::types::{Channel, PoolKind, StockBatch};
use crate::validation::{
    merged_quantity, validate_batch, validate_item_code, validate_quantity,
};

// =============================================================================
// Clock
// =============================================================================

/// Source of "today" for expiry calculations.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

// =============================================================================
// Requests and Results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub item_code: String,
    pub quantity: i64,
}

impl AllocationRequest {
    pub fn new(item_code: impl Into<String>, quantity: i64) -> Self {
        AllocationRequest {
            item_code: item_code.into(),
            quantity,
        }
    }
}

/// Quantity taken from one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub batch_id: String,
    pub item_code: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub item_code: String,
    pub item_name: String,
    pub available: i64,
    /// `3 × threshold − available`
    pub suggested_reorder: i64,
}

// =============================================================================
// Inventory Ledger
// =============================================================================

pub struct InventoryLedger {
    pool: PoolKind,
    urgency_window_days: i64,
    clock: Arc<dyn Clock>,
    batches: Mutex<HashMap<String, Vec<StockBatch>>>,
    /// Serialises snapshot + `StockStore::save`.
    save_gate: Mutex<()>,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger")
            .field("pool", &self.pool)
            .field("urgency_window_days", &self.urgency_window_days)
            .field("items", &self.lock().len())
            .finish()
    }
}

impl InventoryLedger {
    /// Empty pool with the system clock and the default urgency window.
    pub fn new(pool: PoolKind) -> Self {
        InventoryLedger {
            pool,
            urgency_window_days: DEFAULT_URGENCY_WINDOW_DAYS,
            clock: Arc::new(SystemClock),
            batches: Mutex::new(HashMap::new()),
            save_gate: Mutex::new(()),
        }
    }

    /// Rebuilds a pool from stored batches (see `StockStore::load`).
    pub fn from_batches(pool: PoolKind, batches: impl IntoIterator<Item = StockBatch>) -> Self {
        let ledger = Self::new(pool);
        {
            let mut map = ledger.lock();
            for batch in batches {
                map.entry(batch.item_code.clone()).or_default().push(batch);
            }
        }
        ledger
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_urgency_window(mut self, days: i64) -> Self {
        self.urgency_window_days = days;
        self
    }

    pub fn pool(&self) -> PoolKind {
        self.pool
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<StockBatch>>> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Restock
    // -------------------------------------------------------------------------

    /// Adds a received batch to the pool.
    pub fn restock(&self, batch: StockBatch) -> SaleResult<()> {
        validate_item_code(&batch.item_code)?;
        validate_batch(batch.current_quantity, batch.purchase_date, batch.expiry_date)?;

        info!(
            pool = %self.pool,
            code = %batch.item_code,
            quantity = batch.current_quantity,
            expiry = %batch.expiry_date,
            "Restocked batch"
        );
        self.lock()
            .entry(batch.item_code.clone())
            .or_default()
            .push(batch);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Σ current quantity over available batches of `code`.
    pub fn available_quantity(&self, code: &str) -> i64 {
        self.lock().get(code).map(|b| available_in(b)).unwrap_or(0)
    }

    /// Advisory only. Not a reservation.
    pub fn has_stock(&self, code: &str, qty: i64) -> bool {
        self.available_quantity(code) >= qty
    }

    /// Batches of `code`, exhausted ones included, in allocation order.
    pub fn batches(&self, code: &str) -> Vec<StockBatch> {
        let today = self.today();
        let mut batches = self.lock().get(code).cloned().unwrap_or_default();
        batches.sort_by_key(|b| self.priority(b, today));
        batches
    }

    /// Every batch in the pool, grouped by item code.
    pub fn snapshot(&self) -> Vec<StockBatch> {
        let map = self.lock();
        let mut codes: Vec<&String> = map.keys().collect();
        codes.sort();
        let all: Vec<StockBatch> = codes
            .into_iter()
            .flat_map(|code| map[code].iter().cloned())
            .collect();
        all
    }

    /// Snapshots the pool and writes it to `store` as one step with respect
    /// to other saves of this ledger. Allocations are not blocked by the
    /// write.
    pub fn persist_to(&self, store: &dyn StockStore, channel: Channel) -> SaleResult<()> {
        let _gate = self.save_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot();
        store.save(channel, &snapshot)?;
        debug!(pool = %self.pool, batches = snapshot.len(), "Pool persisted");
        Ok(())
    }

    /// Items at or below `threshold` units, by code.
    pub fn low_stock_items(&self, threshold: i64) -> Vec<LowStockItem> {
        let map = self.lock();
        let mut low: Vec<LowStockItem> = map
            .iter()
            .filter_map(|(code, batches)| {
                let available = available_in(batches);
                (available <= threshold).then(|| LowStockItem {
                    item_code: code.clone(),
                    item_name: batches
                        .first()
                        .map(|b| b.item_name.clone())
                        .unwrap_or_default(),
                    available,
                    suggested_reorder: 3 * threshold - available,
                })
            })
            .collect();
        low.sort_by(|a, b| a.item_code.cmp(&b.item_code));
        low
    }

    /// Available batches expiring within `days` of today (already expired
    /// included), soonest first.
    pub fn expiring_within(&self, days: i64) -> Vec<StockBatch> {
        let today = self.today();
        let mut expiring: Vec<StockBatch> = self
            .lock()
            .values()
            .flatten()
            .filter(|b| b.is_available() && b.days_until_expiry(today) <= days)
            .cloned()
            .collect();
        expiring.sort_by(|a, b| {
            (a.expiry_date, &a.item_code).cmp(&(b.expiry_date, &b.item_code))
        });
        expiring
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    /// Deducts `qty` of `code`, all or nothing.
    pub fn allocate(&self, code: &str, qty: i64) -> SaleResult<Vec<Allocation>> {
        self.allocate_all(&[AllocationRequest::new(code, qty)])
    }

    /// Deducts every request, or none of them.
    pub fn allocate_all(&self, requests: &[AllocationRequest]) -> SaleResult<Vec<Allocation>> {
        self.commit_sale(requests, || Ok(()))
            .map(|((), allocations)| allocations)
    }

    /// Checks stock for every request, runs `commit`, then deducts, all under
    /// the pool lock.
    ///
    /// `commit` does not run when stock is short. Nothing is deducted when
    /// `commit` fails; its error is returned unchanged.
    pub fn commit_sale<T, F>(
        &self,
        requests: &[AllocationRequest],
        commit: F,
    ) -> SaleResult<(T, Vec<Allocation>)>
    where
        F: FnOnce() -> SaleResult<T>,
    {
        let wanted = merge_requests(requests)?;
        let today = self.today();
        let mut map = self.lock();

        for (code, &requested) in &wanted {
            let available = map.get(*code).map(|b| available_in(b)).unwrap_or(0);
            if available < requested {
                warn!(
                    pool = %self.pool,
                    code = %code,
                    available,
                    requested,
                    "Allocation rejected"
                );
                return Err(SaleError::InsufficientStock {
                    code: (*code).to_string(),
                    available,
                    requested,
                });
            }
        }

        let outcome = commit()?;

        let mut allocations = Vec::new();
        for (code, requested) in wanted {
            if let Some(batches) = map.get_mut(code) {
                self.deduct(code, batches, requested, today, &mut allocations);
            }
        }

        info!(
            pool = %self.pool,
            lines = requests.len(),
            batches_touched = allocations.len(),
            "Stock allocated"
        );
        Ok((outcome, allocations))
    }

    // -------------------------------------------------------------------------
    // Transfer
    // -------------------------------------------------------------------------

    /// Moves `qty` of `code` from this STORE pool into the WEBSITE pool
    /// `target`, all or nothing.
    ///
    /// Stock leaves in allocation order. Every source batch drawn from gives
    /// one new batch in `target` with the same purchase and expiry dates.
    pub fn transfer_to(
        &self,
        target: &InventoryLedger,
        code: &str,
        qty: i64,
    ) -> SaleResult<Vec<StockBatch>> {
        if !policy::can_access_pool(Channel::Counter, self.pool) {
            return Err(SaleError::InvalidChannelForInventory {
                channel: Channel::Counter,
                pool: self.pool,
            });
        }
        if !policy::can_access_pool(Channel::Online, target.pool) {
            return Err(SaleError::InvalidChannelForInventory {
                channel: Channel::Online,
                pool: target.pool,
            });
        }

        let allocations = self.allocate(code, qty)?;
        let sources = self.batches(code);
        let moved: Vec<StockBatch> = allocations
            .iter()
            .filter_map(|allocation| {
                let source = sources.iter().find(|b| b.id == allocation.batch_id)?;
                Some(StockBatch {
                    id: uuid::Uuid::new_v4().to_string(),
                    item_code: source.item_code.clone(),
                    item_name: source.item_name.clone(),
                    original_quantity: allocation.quantity,
                    current_quantity: allocation.quantity,
                    purchase_date: source.purchase_date,
                    expiry_date: source.expiry_date,
                })
            })
            .collect();

        target
            .lock()
            .entry(code.to_string())
            .or_default()
            .extend(moved.iter().cloned());

        info!(
            from = %self.pool,
            to = %target.pool,
            code = %code,
            quantity = qty,
            batches = moved.len(),
            "Transferred stock"
        );
        Ok(moved)
    }

    fn deduct(
        &self,
        code: &str,
        batches: &mut [StockBatch],
        mut remaining: i64,
        today: NaiveDate,
        allocations: &mut Vec<Allocation>,
    ) {
        let mut order: Vec<usize> = (0..batches.len())
            .filter(|&i| batches[i].is_available())
            .collect();
        order.sort_by_key(|&i| self.priority(&batches[i], today));

        for idx in order {
            if remaining == 0 {
                break;
            }
            let batch = &mut batches[idx];
            let take = remaining.min(batch.current_quantity);
            batch.current_quantity -= take;
            remaining -= take;
            allocations.push(Allocation {
                batch_id: batch.id.clone(),
                item_code: code.to_string(),
                quantity: take,
            });
        }
    }

    fn priority(&self, batch: &StockBatch, today: NaiveDate) -> (u8, NaiveDate, NaiveDate) {
        let bucket = if batch.days_until_expiry(today) <= self.urgency_window_days {
            0
        } else {
            1
        };
        (bucket, batch.expiry_date, batch.purchase_date)
    }
}

fn available_in(batches: &[StockBatch]) -> i64 {
    batches
        .iter()
        .filter(|b| b.is_available())
        .map(|b| b.current_quantity)
        .sum()
}

/// Validates requests and sums duplicate codes. Ordered by code so that
/// results are deterministic.
fn merge_requests(requests: &[AllocationRequest]) -> SaleResult<BTreeMap<&str, i64>> {
    let mut wanted: BTreeMap<&str, i64> = BTreeMap::new();
    for request in requests {
        validate_item_code(&request.item_code)?;
        validate_quantity(request.quantity)?;
        let entry = wanted.entry(request.item_code.as_str()).or_insert(0);
        *entry = merged_quantity(*entry, request.quantity)?;
    }
    Ok(wanted)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::money::Money;
    use crate::{MAX_BATCH_QUANTITY, MAX_ITEM_QUANTITY};
    use crate::types::Item;
    use chrono::Duration;
    use proptest::prelude::*;
    use std::thread;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn rice() -> Item {
        Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599))
    }

    fn batch(item: &Item, qty: i64, bought_days_ago: i64, expires_in: i64) -> StockBatch {
        StockBatch::new(
            item,
            qty,
            today() - Duration::days(bought_days_ago),
            today() + Duration::days(expires_in),
        )
    }

    fn ledger(batches: Vec<StockBatch>) -> InventoryLedger {
        InventoryLedger::from_batches(PoolKind::Store, batches)
            .with_clock(Arc::new(FixedClock(today())))
    }

    #[test]
    fn test_allocate_prefers_soonest_expiry() {
        let b1 = batch(&rice(), 5, 10, 2);
        let b2 = batch(&rice(), 10, 1, 30);
        let (id1, id2) = (b1.id.clone(), b2.id.clone());
        let ledger = ledger(vec![b2, b1]);

        let allocations = ledger.allocate("ITEM001", 7).unwrap();

        let batches = ledger.batches("ITEM001");
        let qty = |id: &str| batches.iter().find(|b| b.id == id).unwrap().current_quantity;
        assert_eq!(qty(&id1), 0);
        assert_eq!(qty(&id2), 8);
        assert_eq!(
            allocations,
            vec![
                Allocation { batch_id: id1.clone(), item_code: "ITEM001".into(), quantity: 5 },
                Allocation { batch_id: id2, item_code: "ITEM001".into(), quantity: 2 },
            ]
        );
        // exhausted batch is retained
        assert_eq!(batches.len(), 2);
        assert!(!batches.iter().find(|b| b.id == id1).unwrap().is_available());
    }

    #[test]
    fn test_same_expiry_breaks_tie_on_purchase_date() {
        let older = batch(&rice(), 3, 20, 60);
        let newer = batch(&rice(), 3, 5, 60);
        let older_id = older.id.clone();
        let ledger = ledger(vec![newer, older]);

        let allocations = ledger.allocate("ITEM001", 2).unwrap();
        assert_eq!(allocations[0].batch_id, older_id);
    }

    #[test]
    fn test_urgent_batches_sort_first() {
        let ledger = ledger(vec![
            batch(&rice(), 1, 0, 90),
            batch(&rice(), 1, 0, 29),
            batch(&rice(), 1, 0, 45),
        ]);

        let order: Vec<NaiveDate> = ledger.batches("ITEM001").iter().map(|b| b.expiry_date).collect();
        assert_eq!(
            order,
            vec![
                today() + Duration::days(29),
                today() + Duration::days(45),
                today() + Duration::days(90),
            ]
        );
    }

    #[test]
    fn test_oversell_leaves_pool_unchanged() {
        let ledger = ledger(vec![batch(&rice(), 5, 1, 2), batch(&rice(), 10, 1, 30)]);
        let before = ledger.snapshot();

        let err = ledger.allocate("ITEM001", 16).unwrap_err();

        assert_eq!(
            err,
            SaleError::InsufficientStock {
                code: "ITEM001".to_string(),
                available: 15,
                requested: 16,
            }
        );
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_allocate_all_is_all_or_nothing() {
        let tea = Item::new("ITEM002", "Tea 500g", Money::from_cents(2000));
        let ledger = ledger(vec![batch(&rice(), 10, 1, 30), batch(&tea, 1, 1, 30)]);

        let result = ledger.allocate_all(&[
            AllocationRequest::new("ITEM001", 4),
            AllocationRequest::new("ITEM002", 2),
        ]);

        assert!(matches!(result, Err(SaleError::InsufficientStock { .. })));
        assert_eq!(ledger.available_quantity("ITEM001"), 10);
        assert_eq!(ledger.available_quantity("ITEM002"), 1);
    }

    #[test]
    fn test_duplicate_requests_are_summed() {
        let ledger = ledger(vec![batch(&rice(), 5, 1, 30)]);

        let result = ledger.allocate_all(&[
            AllocationRequest::new("ITEM001", 3),
            AllocationRequest::new("ITEM001", 3),
        ]);

        assert!(result.is_err());
        assert_eq!(ledger.available_quantity("ITEM001"), 5);
    }

    #[test]
    fn test_oversized_requests_are_rejected_without_deducting() {
        let ledger = ledger(vec![batch(&rice(), 5, 1, 30)]);

        assert!(matches!(
            ledger.allocate("ITEM001", i64::MAX / 1000),
            Err(SaleError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            ledger.allocate_all(&[
                AllocationRequest::new("ITEM001", MAX_ITEM_QUANTITY),
                AllocationRequest::new("ITEM001", 1),
            ]),
            Err(SaleError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(ledger.restock(batch(&rice(), MAX_BATCH_QUANTITY + 1, 0, 10)).is_err());
        assert_eq!(ledger.available_quantity("ITEM001"), 5);
    }

    #[test]
    fn test_unknown_item_is_insufficient() {
        let ledger = ledger(vec![]);
        assert!(matches!(
            ledger.allocate("ITEM009", 1),
            Err(SaleError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn test_commit_skipped_when_stock_short() {
        let ledger = ledger(vec![batch(&rice(), 1, 1, 30)]);
        let mut ran = false;

        let result = ledger.commit_sale(&[AllocationRequest::new("ITEM001", 2)], || {
            ran = true;
            Ok(())
        });

        assert!(result.is_err());
        assert!(!ran);
    }

    #[test]
    fn test_failed_commit_deducts_nothing() {
        let ledger = ledger(vec![batch(&rice(), 5, 1, 30)]);

        let result: SaleResult<((), _)> =
            ledger.commit_sale(&[AllocationRequest::new("ITEM001", 2)], || {
                Err(SaleError::Persistence("sequence unavailable".into()))
            });

        assert_eq!(
            result.unwrap_err(),
            SaleError::Persistence("sequence unavailable".into())
        );
        assert_eq!(ledger.available_quantity("ITEM001"), 5);
    }

    #[test]
    fn test_restock_rejects_bad_batches() {
        let ledger = ledger(vec![]);
        let mut bad = batch(&rice(), 5, 0, 10);
        bad.expiry_date = bad.purchase_date - Duration::days(1);

        assert!(matches!(ledger.restock(bad), Err(SaleError::Validation(_))));
        assert!(ledger.restock(batch(&rice(), -1, 0, 10)).is_err());

        ledger.restock(batch(&rice(), 5, 0, 10)).unwrap();
        assert_eq!(ledger.available_quantity("ITEM001"), 5);
        assert!(ledger.has_stock("ITEM001", 5));
        assert!(!ledger.has_stock("ITEM001", 6));
    }

    #[test]
    fn test_low_stock_items_and_reorder_quantity() {
        let tea = Item::new("ITEM002", "Tea 500g", Money::from_cents(2000));
        let sugar = Item::new("ITEM003", "Sugar 1kg", Money::from_cents(450));
        let ledger = ledger(vec![
            batch(&rice(), 30, 1, 30),
            batch(&rice(), 20, 1, 60),
            batch(&tea, 51, 1, 30),
            batch(&sugar, 0, 1, 30),
        ]);

        let low = ledger.low_stock_items(50);

        assert_eq!(low.len(), 2);
        assert_eq!(low[0].item_code, "ITEM001");
        assert_eq!(low[0].available, 50);
        assert_eq!(low[0].suggested_reorder, 100);
        assert_eq!(low[1].item_code, "ITEM003");
        assert_eq!(low[1].suggested_reorder, 150);
    }

    #[test]
    fn test_expiring_within() {
        let ledger = ledger(vec![
            batch(&rice(), 5, 1, 10),
            batch(&rice(), 5, 1, 3),
            batch(&rice(), 5, 1, 40),
            batch(&rice(), 0, 1, 1),
        ]);

        let expiring = ledger.expiring_within(14);

        assert_eq!(expiring.len(), 2);
        assert_eq!(expiring[0].expiry_date, today() + Duration::days(3));
    }

    #[test]
    fn test_concurrent_allocations_never_oversell() {
        let ledger = Arc::new(ledger(vec![batch(&rice(), 50, 1, 30), batch(&rice(), 50, 1, 60)]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    (0..20)
                        .filter(|_| ledger.allocate("ITEM001", 1).is_ok())
                        .count()
                })
            })
            .collect();

        let sold: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(sold, 100);
        assert_eq!(ledger.available_quantity("ITEM001"), 0);
        assert!(ledger.snapshot().iter().all(|b| b.current_quantity == 0));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 200,
            ..ProptestConfig::default()
        })]

        #[test]
        fn test_stock_never_goes_negative(
            stock in prop::collection::vec((0i64..20, 0i64..90), 1..6),
            requests in prop::collection::vec(1i64..30, 1..12),
        ) {
            let batches = stock
                .iter()
                .map(|&(qty, expires_in)| batch(&rice(), qty, 1, expires_in))
                .collect();
            let ledger = ledger(batches);
            let mut expected = ledger.available_quantity("ITEM001");

            for qty in requests {
                match ledger.allocate("ITEM001", qty) {
                    Ok(allocs) => {
                        prop_assert_eq!(allocs.iter().map(|a| a.quantity).sum::<i64>(), qty);
                        expected -= qty;
                    }
                    Err(SaleError::InsufficientStock { available, .. }) => {
                        prop_assert!(available < qty);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
                prop_assert_eq!(ledger.available_quantity("ITEM001"), expected);
                prop_assert!(ledger.snapshot().iter().all(|b| b.current_quantity >= 0));
            }
        }
    }

    fn website(batches: Vec<StockBatch>) -> InventoryLedger {
        InventoryLedger::from_batches(PoolKind::Website, batches)
            .with_clock(Arc::new(FixedClock(today())))
    }

    #[test]
    fn test_transfer_moves_store_stock_into_website_pool() {
        let soon = batch(&rice(), 5, 10, 2);
        let later = batch(&rice(), 10, 1, 30);
        let (soon_expiry, later_expiry) = (soon.expiry_date, later.expiry_date);
        let store = ledger(vec![later, soon]);
        let web = website(vec![batch(&rice(), 3, 1, 60)]);

        let moved = store.transfer_to(&web, "ITEM001", 7).unwrap();

        assert_eq!(moved.len(), 2);
        assert_eq!((moved[0].current_quantity, moved[0].expiry_date), (5, soon_expiry));
        assert_eq!((moved[1].current_quantity, moved[1].expiry_date), (2, later_expiry));
        assert!(moved.iter().all(|b| b.original_quantity == b.current_quantity));
        assert_eq!(store.available_quantity("ITEM001"), 8);
        assert_eq!(web.available_quantity("ITEM001"), 10);
        assert_eq!(web.batches("ITEM001").len(), 3);
    }

    #[test]
    fn test_transfer_short_stock_touches_neither_pool() {
        let store = ledger(vec![batch(&rice(), 4, 1, 30)]);
        let web = website(vec![]);

        let err = store.transfer_to(&web, "ITEM001", 5).unwrap_err();

        assert!(matches!(err, SaleError::InsufficientStock { available: 4, .. }));
        assert_eq!(store.available_quantity("ITEM001"), 4);
        assert!(web.snapshot().is_empty());
    }

    #[test]
    fn test_transfer_only_runs_store_to_website() {
        let web = website(vec![batch(&rice(), 10, 1, 30)]);
        let store = ledger(vec![batch(&rice(), 10, 1, 30)]);
        let other_store = ledger(vec![]);

        assert_eq!(
            web.transfer_to(&store, "ITEM001", 1).unwrap_err(),
            SaleError::InvalidChannelForInventory {
                channel: Channel::Counter,
                pool: PoolKind::Website,
            }
        );
        assert_eq!(
            store.transfer_to(&other_store, "ITEM001", 1).unwrap_err(),
            SaleError::InvalidChannelForInventory {
                channel: Channel::Online,
                pool: PoolKind::Store,
            }
        );
        assert_eq!(web.available_quantity("ITEM001"), 10);
        assert_eq!(store.available_quantity("ITEM001"), 10);
    }
}
