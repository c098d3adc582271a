//! # outlet-core: Dual-Channel Sales Logic
//!
//! Sales processing for an outlet with an in-person counter and a web
//! storefront. Turns item selections into committed, immutable bills while
//! deducting from a batch-based, expiry-aware inventory pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Synex Outlet Architecture                        │
//! │                                                                         │
//! │     Counter terminal                      Web storefront                │
//! │            │                                     │                      │
//! │  ┌─────────▼─────────────────────────────────────▼─────────────────┐   │
//! │  │               ★ outlet-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   SaleFacade (COUNTER)              SaleFacade (ONLINE)         │   │
//! │  │      │  CheckoutSession ──► BillAssembler ──► Bill              │   │
//! │  │      │  TransactionPolicy (policy)                              │   │
//! │  │      ▼                                    ▼                     │   │
//! │  │   InventoryLedger (STORE)          InventoryLedger (WEBSITE)    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O: collaborators are traits                              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             outlet-db (SQLite collaborators)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer cents, no floating point
//! - [`types`] - Item, StockBatch, LineItem, Bill, Channel
//! - [`error`] - `SaleError`, `ValidationError`
//! - [`validation`] - Input checks
//! - [`config`] - `OutletConfig`
//! - [`policy`] - Channel → store type, cash rule, pool, shipping
//! - [`session`] - Checkout state machine
//! - [`bill`] - Bill assembly
//! - [`ledger`] - Batch allocation
//! - [`collaborators`] - Catalog, invoice, bill and stock contracts
//! - [`facade`] - `SaleFacade`
//! - [`report`] - Daily sales, reorder, stock, receipts
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use outlet_core::collaborators::*;
//! use outlet_core::facade::{Collaborators, SaleFacade};
//! use outlet_core::{Channel, InventoryLedger, Item, Money, OutletConfig, PoolKind, StockBatch};
//!
//! let rice = Item::new("ITEM001", "Rice 1kg", Money::from_cents(1599));
//! let ledger = Arc::new(InventoryLedger::new(PoolKind::Store));
//! let today = Utc::now().date_naive();
//! ledger.restock(StockBatch::new(&rice, 10, today, today + Duration::days(90))).unwrap();
//!
//! let collaborators = Collaborators {
//!     catalog: Arc::new(InMemoryCatalog::with_items([rice])),
//!     invoices: Arc::new(SerialInvoiceSequence::new("")),
//!     bills: Arc::new(InMemoryBillStore::new()),
//!     stock: Arc::new(InMemoryStockStore::new()),
//! };
//! let mut counter = SaleFacade::counter(ledger, collaborators, &OutletConfig::default()).unwrap();
//!
//! counter.start(Channel::Counter).unwrap();
//! counter.add_item("ITEM001", 2).unwrap();
//! let receipt = counter.complete_sale(Money::from_cents(5000)).unwrap();
//!
//! assert_eq!(receipt.bill.total().cents(), 3198);
//! assert_eq!(receipt.bill.change().cents(), 1802);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod facade;
pub mod ledger;
pub mod money;
pub mod policy;
pub mod report;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Crate-Level Limits
// =============================================================================

/// Largest quantity of one item on a single cart line or allocation.
///
/// Catches keying mistakes (10000 instead of 10) and keeps
/// `unit price × quantity` well inside `i64`.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest unit price accepted from the catalog, in cents.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Largest quantity a single restocked batch may carry.
pub const MAX_BATCH_QUANTITY: i64 = 1_000_000;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::OutletConfig;
pub use error::{SaleError, SaleResult, ValidationError};
pub use facade::{transfer_stock, CheckoutSummary, Collaborators, SaleFacade, SaleReceipt};
pub use ledger::{Allocation, AllocationRequest, InventoryLedger, LowStockItem};
pub use money::Money;
pub use session::{CheckoutSession, CheckoutState};
pub use types::*;
