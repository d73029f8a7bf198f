//! # installo-ledger: Capital Ledger for Installo
//!
//! Applies sales and installment payments to partner balances, and keeps
//! those balances honest against the event history.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ledger Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 FinancialReconciler (on demand)                  │  │
//! │  │   checks (a)..(e) ──► recompute_all ──► re-check ──► report      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │  ┌────────────────────────────▼─────────────────────────────────────┐  │
//! │  │                        CapitalLedger                             │  │
//! │  │  register_sale · pay_installment · apply_purchase                │  │
//! │  │  apply_installment_payment · apply_initial_profit · recompute    │  │
//! │  │  admit/retire partner · record_transaction · financial_summary   │  │
//! │  └──────────────┬────────────────────────────────┬──────────────────┘  │
//! │                 │                                │                      │
//! │  ┌──────────────▼──────────────┐  ┌──────────────▼──────────────────┐  │
//! │  │        installo-core        │  │      Arc<dyn LedgerStore>       │  │
//! │  │  schedules · allocate ·     │  │  MemoryStore │ installo-db      │  │
//! │  │  PartnershipHistory         │  │              │ Database         │  │
//! │  └─────────────────────────────┘  └─────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`ledger`] - `CapitalLedger` and its result types
//! - [`reconciler`] - `FinancialReconciler`, drift warnings, reports
//! - [`store`] - `LedgerStore` trait and the in-memory store
//! - [`config`] - Engine configuration (TOML + environment)
//! - [`error`] - Ledger error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use installo_ledger::{CapitalLedger, EngineConfig, FinancialReconciler, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let ledger = CapitalLedger::new(store, EngineConfig::load_or_default(None));
//!
//! let partner = ledger.admit_partner("Reza", capital, join_date).await?;
//! let planned = ledger.register_sale(draft).await?;
//! ledger.pay_installment(&planned.installments[0].id, paid_on).await?;
//!
//! let report = FinancialReconciler::new(ledger).validate().await?;
//! println!("valid: {}", report.is_valid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod reconciler;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{EngineConfig, ReconciliationConfig, ScheduleConfig};
pub use error::{ConfigError, LedgerError, LedgerResult};
pub use ledger::{
    Availability, CapitalLedger, FinancialSummary, PartnerSummary, PaymentAllocation,
    RecomputeSummary,
};
pub use reconciler::{
    Correction, DriftWarning, FinancialReconciler, FinancialReport, ReconciliationReport,
};
pub use store::{LedgerStore, MemoryStore, StoreError, StoreResult};
