//! # Persistence Collaborator
//!
//! The ledger never owns storage. It reads and writes through
//! [`LedgerStore`], injected as `Arc<dyn LedgerStore>`.
//!
//! ```text
//! ┌───────────────────┐        ┌──────────────────────────────────────┐
//! │   CapitalLedger   │──────► │ dyn LedgerStore                      │
//! │ FinancialReconciler│        │  ├── MemoryStore (this crate, tests) │
//! └───────────────────┘        │  └── Database    (installo-db)       │
//!                              └──────────────────────────────────────┘
//! ```
//!
//! Every call is independent: the trait promises no multi-call atomicity
//! except for [`LedgerStore::insert_sale`], which writes a sale and its
//! installments together.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use installo_core::{
    CapitalTransaction, Installment, InstallmentPatch, Partner, PartnerPatch, Sale, SalePatch,
};

pub use memory::MemoryStore;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by a store implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Anything the backend could not do (I/O, constraint, pool...).
    #[error("{0}")]
    Backend(String),
}

/// Storage operations the ledger needs.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Partners in roster order. Retired partners only when
    /// `include_inactive` is set.
    async fn list_partners(&self, include_inactive: bool) -> StoreResult<Vec<Partner>>;

    async fn list_sales(&self) -> StoreResult<Vec<Sale>>;

    async fn list_installments(&self) -> StoreResult<Vec<Installment>>;

    async fn list_transactions(&self) -> StoreResult<Vec<CapitalTransaction>>;

    async fn update_partner(&self, id: &str, patch: &PartnerPatch) -> StoreResult<()>;

    async fn update_sale(&self, id: &str, patch: &SalePatch) -> StoreResult<()>;

    async fn update_installment(&self, id: &str, patch: &InstallmentPatch) -> StoreResult<()>;

    async fn insert_partner(&self, partner: &Partner) -> StoreResult<()>;

    /// Writes a sale and all of its installments atomically.
    async fn insert_sale(&self, sale: &Sale, installments: &[Installment]) -> StoreResult<()>;

    async fn insert_transaction(&self, transaction: &CapitalTransaction) -> StoreResult<()>;
}
