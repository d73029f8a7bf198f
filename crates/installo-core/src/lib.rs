//! # installo-core: Pure Business Logic for Installo
//!
//! This crate holds the numeric heart of the capital & profit allocation
//! engine. Everything here is a pure function over plain data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Installo Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              UI / business-process code (external)              │   │
//! │  │    register sale ──► pay installment ──► partner dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           installo-ledger (CapitalLedger, Reconciler)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ installo-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐   │   │
//! │  │  │amortization│ │ allocation │ │  history   │ │   money    │   │   │
//! │  │  │  Schedule  │ │  allocate  │ │ Partnership│ │ Money/Rate │   │   │
//! │  │  │  policies  │ │  Portion   │ │  History   │ │            │   │   │
//! │  │  └────────────┘ └────────────┘ └────────────┘ └────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Partner, Sale, Installment, CapitalTransaction)
//! - [`money`] - Money and Rate with integer arithmetic
//! - [`amortization`] - Installment schedules under three interest policies
//! - [`allocation`] - Exact-sum proportional splitting
//! - [`history`] - Date → active-partner-set reconstruction
//! - [`plan`] - Turns a sale draft into sale + installment records
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use installo_core::amortization::{compute_schedule, ScheduleSettings};
//! use installo_core::{InterestPolicy, Money};
//!
//! let schedule = compute_schedule(
//!     Money::from_units(10_000_000),
//!     5,
//!     InterestPolicy::FlatMonthlyOnOriginal,
//!     None,
//!     &ScheduleSettings::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(schedule.total_profit.units(), 2_000_000);
//! assert_eq!(schedule.total_payable.units(), 12_000_000);
//! ```

pub mod allocation;
pub mod amortization;
pub mod error;
pub mod history;
pub mod money;
pub mod plan;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{allocate, Portion, Weight};
pub use amortization::{compute_schedule, Schedule, ScheduleSettings, ScheduledInstallment};
pub use error::{CoreError, CoreResult, ValidationError};
pub use history::{PartnerSnapshot, PartnershipHistory};
pub use money::{Money, Rate};
pub use plan::{plan_sale, PlannedSale, SaleDraft};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Shortest installment plan the business sells.
pub const MIN_TERM_MONTHS: u32 = 2;

/// Longest installment plan the business sells.
pub const MAX_TERM_MONTHS: u32 = 36;

/// Default monthly rate for declining-balance and flat plans (4%).
pub const DEFAULT_MONTHLY_RATE: Rate = Rate::from_bps(400);

/// Lowest rate accepted for a custom lump-sum plan (8%).
pub const MIN_CUSTOM_RATE: Rate = Rate::from_bps(800);

/// Monthly payments of rounded plans are quoted in multiples of this.
pub const PAYMENT_ROUNDING_STEP: i64 = 1000;
