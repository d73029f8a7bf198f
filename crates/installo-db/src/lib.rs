//! # installo-db: Database Layer for Installo
//!
//! SQLite storage for the partnership, its sales and their schedules, with
//! sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Installo Data Flow                               │
//! │                                                                         │
//! │  CapitalLedger / FinancialReconciler (installo-ledger)                 │
//! │       │  Arc<dyn LedgerStore>                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   installo-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ PartnerRepo    │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo       │    │   _schema    │  │   │
//! │  │   │ LedgerStore   │    │ InstallmentRepo│    │              │  │   │
//! │  │   │ (store.rs)    │    │ TransactionRepo│    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repositories (partner, sale, installment, transaction)
//! - [`store`] - `LedgerStore` implementation for [`Database`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use installo_db::{Database, DbConfig};
//! use installo_ledger::{CapitalLedger, EngineConfig};
//!
//! let db = Database::new(DbConfig::new("installo.db")).await?;
//! let ledger = CapitalLedger::new(Arc::new(db.clone()), EngineConfig::load_or_default(None));
//!
//! let partners = db.partners().list(false).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

#[cfg(test)]
mod fixtures;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    InstallmentRepository, PartnerRepository, SaleRepository, TransactionRepository,
};
