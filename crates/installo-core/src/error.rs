//! # Error Types
//!
//! Domain-specific error types for installo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  installo-core errors (this file)                                      │
//! │  ├── CoreError        - Schedule / planning failures                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  installo-ledger errors                                                │
//! │  └── LedgerError      - Insufficient capital, partial application...   │
//! │                                                                         │
//! │  installo-db errors                                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → operator / UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the values that were rejected so the message can be
//! logged and diagnosed without re-running the operation.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pure engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The schedule cannot be built from the given terms.
    ///
    /// ## When This Occurs
    /// - A due date falls outside the calendar chrono can represent
    #[error("Cannot build schedule: {reason}")]
    InvalidSchedule { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Always raised before anything is computed or persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    /// Value must be strictly positive.
    #[error("{field} must be positive, got {actual}")]
    MustBePositive { field: String, actual: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative, got {actual}")]
    MustNotBeNegative { field: String, actual: i64 },

    /// Rate is below the floor allowed for the policy.
    ///
    /// ## Example
    /// A custom lump-sum plan at 7% when the floor is 8%.
    #[error("{field} must be at least {min_bps} bps, got {actual_bps} bps")]
    RateBelowMinimum {
        field: String,
        min_bps: u32,
        actual_bps: u32,
    },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields disagree (e.g., down payment not below announced price).
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::OutOfRange {
            field: "term_months".to_string(),
            min: 2,
            max: 36,
            actual: 40,
        };
        assert_eq!(err.to_string(), "term_months must be between 2 and 36, got 40");

        let err = ValidationError::RateBelowMinimum {
            field: "custom_rate".to_string(),
            min_bps: 800,
            actual_bps: 700,
        };
        assert_eq!(
            err.to_string(),
            "custom_rate must be at least 800 bps, got 700 bps"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
