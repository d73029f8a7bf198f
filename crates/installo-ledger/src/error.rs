//! # Ledger Error Types
//!
//! Error types for ledger and reconciliation operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Input       │  │    Business     │  │     Consistency         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  Insufficient-  │  │  PartialApplication     │ │
//! │  │  Core           │  │   Capital       │  │  UnresolvedInconsist.   │ │
//! │  │  NotFound       │  │  Insufficient-  │  │                         │ │
//! │  │                 │  │   Balance       │  │                         │ │
//! │  │                 │  │  AlreadyPaid    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Storage      │  │  Configuration  │                              │
//! │  │  Store          │  │  Config         │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Input and business errors are raised before anything is written.
//! Consistency errors mean the stored totals may now disagree with the event
//! history; `CapitalLedger::recompute_all` repairs them.

use chrono::NaiveDate;
use thiserror::Error;

use installo_core::{CoreError, Money, ValidationError};

use crate::reconciler::DriftWarning;
use crate::store::StoreError;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Everything a ledger or reconciler operation can fail with.
#[derive(Debug, Error)]
pub enum LedgerError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // =========================================================================
    // Business Errors
    // =========================================================================
    /// The partners active at the sale date cannot fund the purchase.
    ///
    /// ## When This Occurs
    /// Σ available capital of partners active on `as_of` is below the price.
    /// No partner has been touched.
    #[error("Insufficient capital on {as_of}: requested {requested}, available {available}, short by {shortfall} ({partners} active partners)")]
    InsufficientCapital {
        requested: Money,
        available: Money,
        shortfall: Money,
        as_of: NaiveDate,
        partners: usize,
    },

    /// A withdrawal exceeds the balance it draws from.
    #[error("Partner {partner_id} has {available} of {balance}, cannot take {requested}")]
    InsufficientBalance {
        partner_id: String,
        balance: &'static str,
        requested: Money,
        available: Money,
    },

    /// The installment was already settled.
    #[error("Installment {installment_id} is already paid")]
    AlreadyPaid { installment_id: String },

    // =========================================================================
    // Consistency Errors
    // =========================================================================
    /// An operation's writes stopped partway.
    ///
    /// ## When This Occurs
    /// The store rejected a write after `applied` of `total` writes went
    /// through. Writes span sale, installment, transaction and partner
    /// records; `failed_at` is the id of the record that was not written.
    /// The ledger is now out of step with the event history until
    /// `recompute_all` runs. The operation is never retried automatically.
    #[error("{operation} stopped after {applied}/{total} writes, failed at {failed_at}: {source}")]
    PartialApplication {
        operation: &'static str,
        applied: usize,
        total: usize,
        failed_at: String,
        #[source]
        source: StoreError,
    },

    /// Drift survived a full recomputation.
    #[error("{} inconsistencies remain after recomputation", .warnings.len())]
    UnresolvedInconsistency { warnings: Vec<DriftWarning> },

    // =========================================================================
    // Infrastructure Errors
    // =========================================================================
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl LedgerError {
    /// Returns true if stored totals may now be inconsistent and a
    /// reconciliation pass should be scheduled.
    pub fn needs_reconciliation(&self) -> bool {
        matches!(
            self,
            LedgerError::PartialApplication { .. } | LedgerError::UnresolvedInconsistency { .. }
        )
    }

    /// Returns true if the error was raised before any write happened.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::Core(_)
                | LedgerError::NotFound { .. }
                | LedgerError::InsufficientCapital { .. }
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::AlreadyPaid { .. }
        )
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Failures loading or saving `installo.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientCapital {
            requested: Money::from_units(20_000_000),
            available: Money::from_units(15_000_000),
            shortfall: Money::from_units(5_000_000),
            as_of: date(2024, 3, 1),
            partners: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient capital on 2024-03-01: requested 20,000,000, available 15,000,000, short by 5,000,000 (2 active partners)"
        );
    }

    #[test]
    fn test_categories() {
        let partial = LedgerError::PartialApplication {
            operation: "apply_purchase",
            applied: 1,
            total: 3,
            failed_at: "p2".into(),
            source: StoreError::Backend("disk full".into()),
        };
        assert!(partial.needs_reconciliation());
        assert!(!partial.is_rejection());

        let rejected = LedgerError::AlreadyPaid {
            installment_id: "i1".into(),
        };
        assert!(rejected.is_rejection());
        assert!(!rejected.needs_reconciliation());
    }

    #[test]
    fn test_validation_converts() {
        let err: LedgerError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
