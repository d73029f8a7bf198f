//! # Proportional Allocation
//!
//! Splits an amount across weighted participants so the parts sum exactly
//! to the input. Every money movement between the business and its partners
//! goes through [`allocate`]: purchase deductions, returned principal,
//! initial profit and monthly profit.
//!
//! ## Remainder Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  amount = 1,000   weights = [A: 1, B: 1, C: 1]   total = 3             │
//! │                                                                         │
//! │  A: floor(1000 × 1/3) = 333      distributed = 333                     │
//! │  B: floor(1000 × 1/3) = 333      distributed = 666                     │
//! │  C: 1000 − 666        = 334      ← last participant takes the rest     │
//! │                                                                         │
//! │  333 + 333 + 334 = 1000  (exact, every time, same order every run)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Participants with zero (or negative) weight stay in the output with a zero
//! portion and are never picked as the remainder holder.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One participant and its weight (usually capital at the event date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    pub id: String,
    pub weight: i64,
}

impl Weight {
    pub fn new(id: impl Into<String>, weight: i64) -> Self {
        Weight {
            id: id.into(),
            weight,
        }
    }
}

/// One participant's share of an allocated amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portion {
    pub id: String,
    pub portion: Money,
}

/// Splits `amount` across `weights` with exact-sum rounding.
///
/// Returns an empty list when the total positive weight is zero; callers
/// treat that as "nobody to distribute to", not as an error.
///
/// ## Example
/// ```rust
/// use installo_core::allocation::{allocate, Weight};
/// use installo_core::Money;
///
/// let parts = allocate(
///     Money::from_units(1_000),
///     &[Weight::new("a", 1), Weight::new("b", 1), Weight::new("c", 1)],
/// );
/// let units: Vec<i64> = parts.iter().map(|p| p.portion.units()).collect();
/// assert_eq!(units, vec![333, 333, 334]);
/// ```
pub fn allocate(amount: Money, weights: &[Weight]) -> Vec<Portion> {
    let total_weight: i128 = weights
        .iter()
        .filter(|w| w.weight > 0)
        .map(|w| w.weight as i128)
        .sum();

    if total_weight == 0 {
        return Vec::new();
    }

    let last_index = weights.iter().rposition(|w| w.weight > 0);
    let amount_i = amount.units() as i128;
    let mut distributed: i128 = 0;

    weights
        .iter()
        .enumerate()
        .map(|(index, w)| {
            let portion = if w.weight <= 0 {
                0
            } else if Some(index) == last_index {
                amount_i - distributed
            } else {
                let share = (amount_i * w.weight as i128).div_euclid(total_weight);
                distributed += share;
                share
            };

            Portion {
                id: w.id.clone(),
                portion: Money::from_units(portion as i64),
            }
        })
        .collect()
}

/// Sums a list of portions.
pub fn total(portions: &[Portion]) -> Money {
    portions.iter().map(|p| p.portion).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn units(portions: &[Portion]) -> Vec<i64> {
        portions.iter().map(|p| p.portion.units()).collect()
    }

    #[test]
    fn test_single_participant_gets_everything() {
        let parts = allocate(Money::from_units(1_234_567), &[Weight::new("a", 5)]);
        assert_eq!(units(&parts), vec![1_234_567]);
    }

    #[test]
    fn test_capital_weighted_split() {
        // 60 / 30 / 10 split of a 20,000,000 purchase
        let weights = vec![
            Weight::new("a", 60_000_000),
            Weight::new("b", 30_000_000),
            Weight::new("c", 10_000_000),
        ];
        let parts = allocate(Money::from_units(20_000_000), &weights);
        assert_eq!(units(&parts), vec![12_000_000, 6_000_000, 2_000_000]);
    }

    #[test]
    fn test_remainder_goes_to_last() {
        let weights = vec![Weight::new("a", 1), Weight::new("b", 1), Weight::new("c", 1)];
        let parts = allocate(Money::from_units(100), &weights);
        assert_eq!(units(&parts), vec![33, 33, 34]);
    }

    #[test]
    fn test_exact_sum_over_many_shapes() {
        let weight_sets: Vec<Vec<i64>> = vec![
            vec![1],
            vec![7, 13],
            vec![3, 3, 3, 3, 3, 3, 3],
            vec![1, 1_000_000_000],
            vec![999_999_937, 2, 45_000_000, 17],
            vec![0, 5, 0, 9, 0],
        ];
        let amounts = [1_i64, 2, 99, 1_000, 15_000_001, 987_654_321_123];

        for set in &weight_sets {
            let weights: Vec<Weight> = set
                .iter()
                .enumerate()
                .map(|(i, w)| Weight::new(format!("p{i}"), *w))
                .collect();
            for amount in amounts {
                let parts = allocate(Money::from_units(amount), &weights);
                assert_eq!(parts.len(), weights.len());
                assert_eq!(total(&parts).units(), amount, "weights {set:?} amount {amount}");
            }
        }
    }

    #[test]
    fn test_zero_weight_never_takes_remainder() {
        let weights = vec![Weight::new("a", 1), Weight::new("b", 2), Weight::new("c", 0)];
        let parts = allocate(Money::from_units(100), &weights);
        assert_eq!(units(&parts), vec![33, 67, 0]);
    }

    #[test]
    fn test_zero_total_weight_is_noop() {
        assert!(allocate(Money::from_units(100), &[]).is_empty());
        let weights = vec![Weight::new("a", 0), Weight::new("b", 0)];
        assert!(allocate(Money::from_units(100), &weights).is_empty());
    }

    #[test]
    fn test_is_deterministic() {
        let weights = vec![Weight::new("a", 7), Weight::new("b", 11), Weight::new("c", 13)];
        let first = allocate(Money::from_units(1_000_003), &weights);
        let second = allocate(Money::from_units(1_000_003), &weights);
        assert_eq!(first, second);
    }

    #[test]
    fn test_negative_amount_still_sums_exactly() {
        let weights = vec![Weight::new("a", 1), Weight::new("b", 2)];
        let parts = allocate(Money::from_units(-100), &weights);
        assert_eq!(total(&parts).units(), -100);
    }
}
