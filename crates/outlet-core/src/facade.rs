//! # Sale Facade
//!
//! The one entry point callers use to run a sale on a channel.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start(channel) ──► add_item / update_item / remove_item / discount    │
//! │                        │ (advisory has_stock pre-check)                 │
//! │                        ▼                                                │
//! │  complete_sale(cash)                                                    │
//! │    1. policy: pool binding, ONLINE forces cash = 0                      │
//! │    2. ledger.commit_sale ─┬─ check every line against the pool          │
//! │                           ├─ pay(cash) + generate_bill()               │
//! │                           └─ deduct every line                          │
//! │       (one critical section; any failure leaves cart and pool as-is)    │
//! │    3. BillStore::persist(bill), StockStore::save(pool)                  │
//! │    4. clear the session, return SaleReceipt                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A facade holds its ledger and its active session directly. Two facades
//! of the same channel may share one `Arc<InventoryLedger>`; each keeps its
//! own session.
//!
//! ## Persistence Failures
//! If step 3 fails the sale is already committed in memory: stock is
//! deducted and the bill exists. The error is returned as-is and the sale
//! is parked. [`SaleFacade::retry_persistence`] finishes the remaining
//! writes; [`SaleFacade::start`] is refused until then.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::bill::BillAssembler;
use crate::collaborators::{BillStore, InvoiceSequence, ItemCatalog, StockStore};
use crate::config::OutletConfig;
use crate::error::{SaleError, SaleResult};
use crate::ledger::{Allocation, AllocationRequest, InventoryLedger};
use crate::money::Money;
use crate::policy::{self, ShippingRule};
use crate::session::CheckoutSession;
use crate::types::{Bill, Channel, LineItem, PoolKind, StockBatch};

// =============================================================================
// Collaborators
// =============================================================================

/// The external services a facade talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ItemCatalog>,
    pub invoices: Arc<dyn InvoiceSequence>,
    pub bills: Arc<dyn BillStore>,
    pub stock: Arc<dyn StockStore>,
}

impl Collaborators {
    /// Uses one backend for all four contracts.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ItemCatalog + InvoiceSequence + BillStore + StockStore + 'static,
    {
        Collaborators {
            catalog: backend.clone(),
            invoices: backend.clone(),
            bills: backend.clone(),
            stock: backend,
        }
    }
}

/// Loads the pool `channel` is bound to from `stock`.
pub fn open_ledger(
    stock: &dyn StockStore,
    channel: Channel,
    config: &OutletConfig,
) -> SaleResult<InventoryLedger> {
    let batches = stock.load(channel)?;
    info!(channel = %channel, batches = batches.len(), "Loaded inventory pool");
    Ok(
        InventoryLedger::from_batches(policy::pool_for(channel), batches)
            .with_urgency_window(config.urgency_window_days),
    )
}

/// Moves `qty` of `code` from the store pool to the website pool, then saves
/// both pools to `stock`.
///
/// The move is all or nothing in memory. A save failure is returned as-is;
/// the ledgers keep the moved stock and the next save from either pool
/// writes it out.
pub fn transfer_stock(
    store: &InventoryLedger,
    website: &InventoryLedger,
    stock: &dyn StockStore,
    code: &str,
    qty: i64,
) -> SaleResult<Vec<StockBatch>> {
    let moved = store.transfer_to(website, code, qty)?;
    store.persist_to(stock, Channel::Counter)?;
    website.persist_to(stock, Channel::Online)?;
    Ok(moved)
}

// =============================================================================
// Summary and Receipt
// =============================================================================

/// What the customer sees before paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutSummary {
    pub channel: Channel,
    pub lines: Vec<LineItem>,
    pub item_count: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    /// Always zero at the counter.
    pub shipping_fee: Money,
    pub grand_total: Money,
}

/// Result of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleReceipt {
    pub bill: Bill,
    pub shipping_fee: Money,
    /// `bill.total() + shipping_fee`
    pub grand_total: Money,
    pub allocations: Vec<Allocation>,
}

#[derive(Debug)]
struct ParkedSale {
    receipt: SaleReceipt,
    bill_saved: bool,
}

// =============================================================================
// Sale Facade
// =============================================================================

pub struct SaleFacade {
    channel: Channel,
    ledger: Arc<InventoryLedger>,
    collaborators: Collaborators,
    shipping: ShippingRule,
    session: Option<CheckoutSession>,
    parked: Option<ParkedSale>,
}

impl SaleFacade {
    /// Counter facade. `ledger` must be the STORE pool.
    pub fn counter(
        ledger: Arc<InventoryLedger>,
        collaborators: Collaborators,
        config: &OutletConfig,
    ) -> SaleResult<Self> {
        Self::for_channel(Channel::Counter, ledger, collaborators, config)
    }

    /// Online facade. `ledger` must be the WEBSITE pool.
    pub fn online(
        ledger: Arc<InventoryLedger>,
        collaborators: Collaborators,
        config: &OutletConfig,
    ) -> SaleResult<Self> {
        Self::for_channel(Channel::Online, ledger, collaborators, config)
    }

    fn for_channel(
        channel: Channel,
        ledger: Arc<InventoryLedger>,
        collaborators: Collaborators,
        config: &OutletConfig,
    ) -> SaleResult<Self> {
        check_pool(channel, ledger.pool())?;
        Ok(SaleFacade {
            channel,
            ledger,
            collaborators,
            shipping: ShippingRule::from_config(config),
            session: None,
            parked: None,
        })
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    pub fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    /// The sale waiting on [`retry_persistence`](Self::retry_persistence).
    pub fn parked_receipt(&self) -> Option<&SaleReceipt> {
        self.parked.as_ref().map(|p| &p.receipt)
    }

    // -------------------------------------------------------------------------
    // Session Lifecycle
    // -------------------------------------------------------------------------

    /// Opens a new checkout, replacing any active one.
    ///
    /// The replaced session is returned so the caller can see what was
    /// dropped. `channel` must match the facade's channel.
    pub fn start(&mut self, channel: Channel) -> SaleResult<Option<CheckoutSession>> {
        if channel != self.channel {
            return Err(SaleError::InvalidChannelForInventory {
                channel,
                pool: self.ledger.pool(),
            });
        }
        if let Some(parked) = &self.parked {
            return Err(SaleError::Persistence(format!(
                "bill {} has not been saved; retry persistence first",
                parked.receipt.bill.invoice_number()
            )));
        }

        let session = CheckoutSession::new(channel);
        info!(channel = %channel, session = %session.id(), "Checkout started");

        let previous = self.session.replace(session);
        if let Some(old) = &previous {
            warn!(
                session = %old.id(),
                lines = old.lines().len(),
                "Active checkout replaced; previous cart discarded"
            );
        }
        Ok(previous)
    }

    /// Drops the active session, if any.
    pub fn abandon(&mut self) -> Option<CheckoutSession> {
        let abandoned = self.session.take();
        if let Some(session) = &abandoned {
            info!(session = %session.id(), "Checkout abandoned");
        }
        abandoned
    }

    fn active(&self) -> SaleResult<&CheckoutSession> {
        self.session.as_ref().ok_or(SaleError::NoActiveSession)
    }

    fn active_mut(&mut self) -> SaleResult<&mut CheckoutSession> {
        self.session.as_mut().ok_or(SaleError::NoActiveSession)
    }

    // -------------------------------------------------------------------------
    // Cart Operations
    // -------------------------------------------------------------------------

    /// Adds `qty` of `code` after checking the pool can cover the line.
    ///
    /// The stock check is advisory. It does not reserve anything.
    pub fn add_item(&mut self, code: &str, qty: i64) -> SaleResult<()> {
        let mut candidate = self.active()?.clone();
        candidate.add_line(self.collaborators.catalog.as_ref(), code, qty)?;
        self.check_line_stock(&candidate, code)?;
        self.session = Some(candidate);
        Ok(())
    }

    /// Sets the quantity for `code`. Zero or less removes the line.
    pub fn update_item(&mut self, code: &str, qty: i64) -> SaleResult<()> {
        let mut candidate = self.active()?.clone();
        candidate.remove_line(code)?;
        if qty > 0 {
            candidate.add_line(self.collaborators.catalog.as_ref(), code, qty)?;
            self.check_line_stock(&candidate, code)?;
        }
        self.session = Some(candidate);
        Ok(())
    }

    pub fn remove_item(&mut self, code: &str) -> SaleResult<Option<LineItem>> {
        self.active_mut()?.remove_line(code)
    }

    pub fn apply_discount(&mut self, amount: Money) -> SaleResult<()> {
        self.active_mut()?.apply_discount(amount)
    }

    fn check_line_stock(&self, session: &CheckoutSession, code: &str) -> SaleResult<()> {
        let wanted = session.line(code).map_or(0, |line| line.quantity);
        let available = self.ledger.available_quantity(code);
        if available < wanted {
            debug!(code, available, wanted, "Add rejected by stock pre-check");
            return Err(SaleError::InsufficientStock {
                code: code.to_string(),
                available,
                requested: wanted,
            });
        }
        Ok(())
    }

    pub fn summary(&self) -> SaleResult<CheckoutSummary> {
        let session = self.active()?;
        let total = session.calculate_total();
        let shipping_fee = self.shipping.fee_for(self.channel, total);

        Ok(CheckoutSummary {
            channel: self.channel,
            lines: session.lines().to_vec(),
            item_count: session.item_count(),
            subtotal: session.subtotal(),
            discount: session.discount(),
            total,
            shipping_fee,
            grand_total: total + shipping_fee,
        })
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Pays, bills, and deducts stock for the active session.
    ///
    /// Online sales are cash on delivery: `cash` is ignored and recorded as
    /// zero. On any error before persistence the session and the pool are
    /// unchanged.
    pub fn complete_sale(&mut self, cash: Money) -> SaleResult<SaleReceipt> {
        check_pool(self.channel, self.ledger.pool())?;
        let session = self.active()?;

        let cash = match self.channel {
            Channel::Counter => cash,
            Channel::Online => {
                if !cash.is_zero() {
                    debug!(ignored = %cash, "Online order is cash on delivery");
                }
                Money::zero()
            }
        };

        let requests: Vec<AllocationRequest> = session
            .lines()
            .iter()
            .map(|line| AllocationRequest::new(line.item_code.clone(), line.quantity))
            .collect();

        let mut draft = session.clone();
        let assembler = BillAssembler::new(self.collaborators.invoices.as_ref(), self.shipping);
        let (bill, allocations) = self.ledger.commit_sale(&requests, || {
            draft.pay(cash)?;
            draft.generate_bill(&assembler).cloned()
        })?;

        let receipt = SaleReceipt {
            shipping_fee: bill.shipping_fee(),
            grand_total: bill.grand_total(),
            bill,
            allocations,
        };
        info!(
            channel = %self.channel,
            invoice = %receipt.bill.invoice_number(),
            total = %receipt.bill.total(),
            grand_total = %receipt.grand_total,
            "Sale completed"
        );

        self.session = None;
        self.parked = Some(ParkedSale {
            receipt,
            bill_saved: false,
        });
        self.flush_parked()
    }

    /// Re-attempts the writes of a sale whose persistence failed.
    pub fn retry_persistence(&mut self) -> SaleResult<SaleReceipt> {
        if self.parked.is_none() {
            return Err(SaleError::NoActiveSession);
        }
        self.flush_parked()
    }

    fn flush_parked(&mut self) -> SaleResult<SaleReceipt> {
        let Some(parked) = self.parked.as_mut() else {
            return Err(SaleError::NoActiveSession);
        };

        if !parked.bill_saved {
            self.collaborators
                .bills
                .persist(&parked.receipt.bill)
                .inspect_err(|e| warn!(error = %e, "Bill persistence failed"))?;
            parked.bill_saved = true;
        }

        self.ledger
            .persist_to(self.collaborators.stock.as_ref(), self.channel)
            .inspect_err(|e| warn!(error = %e, "Stock persistence failed"))?;

        match self.parked.take() {
            Some(parked) => Ok(parked.receipt),
            None => Err(SaleError::NoActiveSession),
        }
    }

    /// Counter-only one-shot sale of a single item.
    ///
    /// Any active session is replaced. On failure the new session is
    /// abandoned.
    pub fn quick_sale(
        &mut self,
        code: &str,
        qty: i64,
        discount: Option<Money>,
        cash: Money,
    ) -> SaleResult<SaleReceipt> {
        if self.channel != Channel::Counter {
            return Err(SaleError::InvalidChannelForInventory {
                channel: self.channel,
                pool: PoolKind::Store,
            });
        }

        self.start(Channel::Counter)?;
        let result = self.run_quick_sale(code, qty, discount, cash);
        if result.is_err() {
            self.abandon();
        }
        result
    }

    fn run_quick_sale(
        &mut self,
        code: &str,
        qty: i64,
        discount: Option<Money>,
        cash: Money,
    ) -> SaleResult<SaleReceipt> {
        self.add_item(code, qty)?;
        if let Some(amount) = discount {
            self.apply_discount(amount)?;
        }
        self.complete_sale(cash)
    }
}

fn check_pool(channel: Channel, pool: PoolKind) -> SaleResult<()> {
    if policy::can_access_pool(channel, pool) {
        Ok(())
    } else {
        Err(SaleError::InvalidChannelForInventory { channel, pool })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
