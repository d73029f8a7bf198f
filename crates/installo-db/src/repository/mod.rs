//! # Repository Module
//!
//! Database repository implementations for Installo.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Database (pool.rs)                                                    │
//! │   ├── partners()      → PartnerRepository      (partners)              │
//! │   ├── sales()         → SaleRepository         (sales + installments)  │
//! │   ├── installments()  → InstallmentRepository  (installments)          │
//! │   └── transactions()  → TransactionRepository  (capital_transactions)  │
//! │                                                                         │
//! │  Each repository owns a clone of the pool and nothing else.            │
//! │  Partial updates use COALESCE(?n, column): a NULL bind keeps the       │
//! │  stored value.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PartnerRepository`] - Roster reads, inserts, balance patches
//! - [`SaleRepository`] - Sales, written together with their installments
//! - [`InstallmentRepository`] - Schedule reads, payment and overdue updates
//! - [`TransactionRepository`] - Capital transaction log

pub mod installment;
pub mod partner;
pub mod sale;
pub mod transaction;

pub use installment::InstallmentRepository;
pub use partner::PartnerRepository;
pub use sale::SaleRepository;
pub use transaction::TransactionRepository;
