//! # Validation Module
//!
//! Input validation for schedules, sales, partners and transactions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI forms (external)                                          │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Term range, rate floors, positive amounts                         │
//! │  └── Runs before anything is computed or written                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite CHECK / FK constraints)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use installo_core::validation::{validate_term_months, validate_positive_amount};
//! use installo_core::Money;
//!
//! validate_term_months(12, 2, 36).unwrap();
//! validate_positive_amount("purchase_price", Money::from_units(20_000_000)).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Rate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an installment term.
///
/// ## Example
/// ```rust
/// use installo_core::validation::validate_term_months;
///
/// assert!(validate_term_months(2, 2, 36).is_ok());
/// assert!(validate_term_months(36, 2, 36).is_ok());
/// assert!(validate_term_months(1, 2, 36).is_err());
/// assert!(validate_term_months(37, 2, 36).is_err());
/// ```
pub fn validate_term_months(term: u32, min: u32, max: u32) -> ValidationResult<()> {
    if term < min || term > max {
        return Err(ValidationError::OutOfRange {
            field: "term_months".to_string(),
            min: min as i64,
            max: max as i64,
            actual: term as i64,
        });
    }

    Ok(())
}

/// Validates that an amount is strictly positive.
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
            actual: amount.units(),
        });
    }

    Ok(())
}

/// Validates that an amount is zero or more.
///
/// ## Example
/// ```rust
/// use installo_core::validation::validate_non_negative_amount;
/// use installo_core::Money;
///
/// assert!(validate_non_negative_amount("interest", Money::zero()).is_ok());
/// assert!(validate_non_negative_amount("interest", Money::from_units(-1)).is_err());
/// ```
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
            actual: amount.units(),
        });
    }

    Ok(())
}

/// Validates a custom lump-sum rate against its floor.
pub fn validate_custom_rate(rate: Option<Rate>, min: Rate) -> ValidationResult<Rate> {
    let rate = rate.ok_or_else(|| ValidationError::Required {
        field: "custom_rate".to_string(),
    })?;

    if rate < min {
        return Err(ValidationError::RateBelowMinimum {
            field: "custom_rate".to_string(),
            min_bps: min.bps(),
            actual_bps: rate.bps(),
        });
    }

    Ok(rate)
}

/// Validates the price structure of a sale.
///
/// ## Rules
/// - purchase price > 0
/// - announced price ≥ purchase price (initial profit is never negative)
/// - 0 ≤ down payment < announced price (something must be financed)
pub fn validate_sale_prices(
    purchase_price: Money,
    announced_price: Money,
    down_payment: Money,
) -> ValidationResult<()> {
    validate_positive_amount("purchase_price", purchase_price)?;
    validate_positive_amount("announced_price", announced_price)?;
    validate_non_negative_amount("down_payment", down_payment)?;

    if announced_price < purchase_price {
        return Err(ValidationError::Inconsistent {
            field: "announced_price".to_string(),
            reason: format!(
                "announced price {} is below purchase price {}",
                announced_price, purchase_price
            ),
        });
    }

    if down_payment >= announced_price {
        return Err(ValidationError::Inconsistent {
            field: "down_payment".to_string(),
            reason: format!(
                "down payment {} must be strictly less than announced price {}",
                down_payment, announced_price
            ),
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a partner name (1..=200 characters after trimming).
pub fn validate_partner_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use installo_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_term_months() {
        assert!(validate_term_months(2, 2, 36).is_ok());
        assert!(validate_term_months(12, 2, 36).is_ok());
        assert!(validate_term_months(36, 2, 36).is_ok());

        assert!(validate_term_months(0, 2, 36).is_err());
        assert!(validate_term_months(1, 2, 36).is_err());
        assert!(validate_term_months(37, 2, 36).is_err());
    }

    #[test]
    fn test_validate_custom_rate() {
        let floor = Rate::from_bps(800);
        assert!(validate_custom_rate(Some(Rate::from_bps(800)), floor).is_ok());
        assert!(validate_custom_rate(Some(Rate::from_bps(1500)), floor).is_ok());

        let err = validate_custom_rate(Some(Rate::from_bps(700)), floor).unwrap_err();
        assert!(matches!(err, ValidationError::RateBelowMinimum { actual_bps: 700, .. }));

        let err = validate_custom_rate(None, floor).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_validate_sale_prices() {
        let m = Money::from_units;
        assert!(validate_sale_prices(m(20_000_000), m(22_000_000), m(2_000_000)).is_ok());
        assert!(validate_sale_prices(m(20_000_000), m(22_000_000), m(0)).is_ok());

        // down payment equal to announced price leaves nothing to finance
        assert!(validate_sale_prices(m(20_000_000), m(22_000_000), m(22_000_000)).is_err());
        // selling below cost
        assert!(validate_sale_prices(m(20_000_000), m(19_000_000), m(0)).is_err());
        assert!(validate_sale_prices(m(0), m(1), m(0)).is_err());
        assert!(validate_sale_prices(m(10), m(20), m(-1)).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_positive_amount("x", Money::from_units(1)).is_ok());
        assert!(validate_positive_amount("x", Money::zero()).is_err());
        assert!(validate_non_negative_amount("x", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("x", Money::from_units(-3)).is_err());
    }

    #[test]
    fn test_validate_partner_name() {
        assert!(validate_partner_name("Reza").is_ok());
        assert!(validate_partner_name("   ").is_err());
        assert!(validate_partner_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
