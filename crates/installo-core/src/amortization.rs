//! # Amortization Schedules
//!
//! Turns a financed amount, a term and an interest policy into a list of
//! installments.
//!
//! ## Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DecliningBalance (4%/month default)                                   │
//! │    principal_i = floor(R / n) (+1 for the first R mod n periods)       │
//! │    interest_i  = round(balance_before_i × rate)                        │
//! │                                                                         │
//! │  FlatMonthlyOnOriginal (4%/month)                                      │
//! │    interest_i  = round(R × rate)          ← same every period          │
//! │    payment     = ceil(payable / n) to the next 1,000                   │
//! │    periods 1..n−1 pay `payment`, period n pays the rest                │
//! │                                                                         │
//! │  CustomLumpSum (≥ 8% over the whole term)                              │
//! │    profit      = round(R × rate), spread over the periods              │
//! │    payment     = same rounding and last-period rule as Flat            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In every policy Σ principal = R and the last `remaining_debt_after` is 0.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::{Money, Rate};
use crate::types::InterestPolicy;
use crate::validation::{validate_custom_rate, validate_positive_amount, validate_term_months};
use crate::{
    DEFAULT_MONTHLY_RATE, MAX_TERM_MONTHS, MIN_CUSTOM_RATE, MIN_TERM_MONTHS, PAYMENT_ROUNDING_STEP,
};

// =============================================================================
// Settings
// =============================================================================

/// Tunables for schedule generation.
///
/// The ledger builds this from its configuration file; the defaults are the
/// business rules the shop has always used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    pub declining_rate: Rate,
    pub flat_rate: Rate,
    pub min_custom_rate: Rate,
    pub min_term_months: u32,
    pub max_term_months: u32,
    /// Monthly payments of Flat/Custom plans are rounded up to a multiple of this.
    pub rounding_step: i64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            declining_rate: DEFAULT_MONTHLY_RATE,
            flat_rate: DEFAULT_MONTHLY_RATE,
            min_custom_rate: MIN_CUSTOM_RATE,
            min_term_months: MIN_TERM_MONTHS,
            max_term_months: MAX_TERM_MONTHS,
            rounding_step: PAYMENT_ROUNDING_STEP,
        }
    }
}

// =============================================================================
// Schedule
// =============================================================================

/// One period of a computed schedule (not yet a persisted installment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScheduledInstallment {
    pub sequence: u32,
    pub principal: Money,
    pub interest: Money,
    pub total: Money,
    pub remaining_debt_after: Money,
}

/// A complete repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Schedule {
    pub policy: InterestPolicy,

    /// The rate actually applied (monthly for Declining/Flat, whole-term for Custom).
    pub rate: Rate,

    pub installments: Vec<ScheduledInstallment>,
    pub total_profit: Money,
    pub total_payable: Money,

    /// The amount quoted to the customer per month.
    pub monthly_payment: Money,
}

impl Schedule {
    /// Σ principal over all periods.
    pub fn total_principal(&self) -> Money {
        self.installments.iter().map(|i| i.principal).sum()
    }

    /// Σ interest over all periods.
    pub fn total_interest(&self) -> Money {
        self.installments.iter().map(|i| i.interest).sum()
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Computes an installment schedule.
///
/// ## Arguments
/// * `remaining` - Financed amount (announced price − down payment), > 0
/// * `term_months` - Number of installments, within the configured range
/// * `policy` - Interest policy
/// * `custom_rate` - Required for CustomLumpSum; overrides the monthly rate
///   for DecliningBalance when given
///
/// ## Errors
/// `CoreError::Validation` for a non-positive amount, an out-of-range term,
/// or a missing / too-low custom rate. Nothing is computed in that case.
///
/// ## Example
/// ```rust
/// use installo_core::amortization::{compute_schedule, ScheduleSettings};
/// use installo_core::{InterestPolicy, Money};
///
/// let s = compute_schedule(
///     Money::from_units(15_000_000),
///     10,
///     InterestPolicy::DecliningBalance,
///     None,
///     &ScheduleSettings::default(),
/// )
/// .unwrap();
///
/// assert_eq!(s.installments[0].interest.units(), 600_000);
/// assert_eq!(s.installments[0].total.units(), 2_100_000);
/// assert!(s.installments[9].remaining_debt_after.is_zero());
/// ```
pub fn compute_schedule(
    remaining: Money,
    term_months: u32,
    policy: InterestPolicy,
    custom_rate: Option<Rate>,
    settings: &ScheduleSettings,
) -> CoreResult<Schedule> {
    validate_positive_amount("remaining_amount", remaining)?;
    validate_term_months(term_months, settings.min_term_months, settings.max_term_months)?;

    let schedule = match policy {
        InterestPolicy::DecliningBalance => {
            let rate = custom_rate.unwrap_or(settings.declining_rate);
            declining_balance(remaining, term_months, rate)
        }
        InterestPolicy::FlatMonthlyOnOriginal => {
            let rate = settings.flat_rate;
            let flat = remaining.apply_rate(rate);
            let interests = vec![flat; term_months as usize];
            rounded_payments(policy, rate, remaining, interests, settings.rounding_step)
        }
        InterestPolicy::CustomLumpSum => {
            let rate = validate_custom_rate(custom_rate, settings.min_custom_rate)?;
            let profit = remaining.apply_rate(rate);
            let interests = profit.spread(term_months);
            rounded_payments(policy, rate, remaining, interests, settings.rounding_step)
        }
    };

    Ok(schedule)
}

// =============================================================================
// Policies
// =============================================================================

fn declining_balance(remaining: Money, term_months: u32, rate: Rate) -> Schedule {
    let mut balance = remaining;
    let mut installments = Vec::with_capacity(term_months as usize);

    for (index, principal) in remaining.spread(term_months).into_iter().enumerate() {
        // interest is charged on the balance before this period's principal
        let interest = balance.apply_rate(rate);
        balance -= principal;

        installments.push(ScheduledInstallment {
            sequence: index as u32 + 1,
            principal,
            interest,
            total: principal + interest,
            remaining_debt_after: balance.floor_zero(),
        });
    }

    let total_profit: Money = installments.iter().map(|i| i.interest).sum();
    let monthly_payment = installments.first().map(|i| i.total).unwrap_or_default();

    Schedule {
        policy: InterestPolicy::DecliningBalance,
        rate,
        installments,
        total_profit,
        total_payable: remaining + total_profit,
        monthly_payment,
    }
}

/// Flat and lump-sum plans: every period but the last pays the rounded
/// monthly payment, the last absorbs whatever is left.
fn rounded_payments(
    policy: InterestPolicy,
    rate: Rate,
    remaining: Money,
    interests: Vec<Money>,
    rounding_step: i64,
) -> Schedule {
    let term = interests.len();
    let total_profit: Money = interests.iter().sum();
    let total_payable = remaining + total_profit;
    let monthly_payment = total_payable.ceil_div_to_step(term as i64, rounding_step);

    let last_total = total_payable - monthly_payment * (term as i64 - 1);
    let totals: Vec<Money> = (0..term)
        .map(|i| if i + 1 == term { last_total } else { monthly_payment })
        .collect();

    let principals: Vec<Money> = totals
        .iter()
        .zip(&interests)
        .map(|(total, interest)| *total - *interest)
        .collect();

    // Rounding up can only starve the last period, and only for amounts
    // that are tiny next to the rounding step. Fall back to level periods.
    let (principals, monthly_payment) = if principals.iter().any(|p| p.is_negative()) {
        let level = remaining.spread(term as u32);
        let first_total = level[0] + interests[0];
        (level, first_total)
    } else {
        (principals, monthly_payment)
    };

    let mut balance = remaining;
    let installments = principals
        .into_iter()
        .zip(interests)
        .enumerate()
        .map(|(index, (principal, interest))| {
            balance -= principal;
            ScheduledInstallment {
                sequence: index as u32 + 1,
                principal,
                interest,
                total: principal + interest,
                remaining_debt_after: balance.floor_zero(),
            }
        })
        .collect();

    Schedule {
        policy,
        rate,
        installments,
        total_profit,
        total_payable,
        monthly_payment,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
