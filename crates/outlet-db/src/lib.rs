//! # outlet-db: SQLite Storage for the Outlet
//!
//! Implements the outlet-core collaborator contracts on SQLite via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Synex Outlet Data Flow                           │
//! │                                                                         │
//! │  SaleFacade::complete_sale                                             │
//! │       │  BillStore::persist, StockStore::save                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   outlet-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   SqliteBackend ──► Database (pool.rs) ──► Repositories         │   │
//! │  │                          │                  items, stock,       │   │
//! │  │                          │                  bills, invoices,    │   │
//! │  │                          ▼                  sync_outbox         │   │
//! │  │                     Migrations (embedded)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (OUTLET_DB_PATH, WAL mode)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and `DbConfig`
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - `DbError` and its mapping into `SaleError`
//! - [`repository`] - One repository per table group
//! - [`backend`] - Blocking adapter implementing the collaborator traits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use outlet_core::facade::{open_ledger, Collaborators, SaleFacade};
//! use outlet_db::{DbConfig, SqliteBackend};
//!
//! let config = OutletConfig::from_env();
//! let backend = Arc::new(SqliteBackend::open(DbConfig::from_env(), &config)?);
//! let ledger = Arc::new(open_ledger(backend.as_ref(), Channel::Counter, &config)?);
//! let counter = SaleFacade::counter(ledger, Collaborators::shared(backend), &config)?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::SqliteBackend;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    BillRepository, InvoiceRepository, ItemRepository, StockRepository, SyncOutboxEntry,
    SyncOutboxRepository,
};
