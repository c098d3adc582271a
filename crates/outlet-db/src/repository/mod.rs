//! # Repository Module
//!
//! One repository per table group, each holding a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ItemRepository        items                                           │
//! │  StockRepository       stock_batches (per channel pool)                │
//! │  BillRepository        bills + bill_lines (+ sync_outbox in same tx)   │
//! │  InvoiceRepository     invoice_sequence                                │
//! │  SyncOutboxRepository  sync_outbox                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read through `#[derive(sqlx::FromRow)]` structs and converted
//! into outlet-core types at the edge of each repository.

pub mod bill;
pub mod invoice;
pub mod item;
pub mod stock;
pub mod sync;

pub use bill::BillRepository;
pub use invoice::InvoiceRepository;
pub use item::ItemRepository;
pub use stock::StockRepository;
pub use sync::{SyncOutboxEntry, SyncOutboxRepository};
