//! # Domain Types
//!
//! Core domain records used throughout Installo.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Partner      │   │      Sale       │   │  Installment    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  capital        │   │  purchase_price │   │  sale_id (FK)   │       │
//! │  │  available_cap. │   │  announced_price│   │  principal      │       │
//! │  │  initial_profit │   │  down_payment   │   │  interest       │       │
//! │  │  monthly_profit │   │  policy / rate  │   │  due_date       │       │
//! │  │  join / leave   │   │  sale_date      │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌───────────────┐   ┌─────────────────┐     │
//! │  │ CapitalTransaction  │   │ InterestPolicy│   │ Sale/Installment│     │
//! │  │  ─────────────────  │   │  Declining... │   │ Status          │     │
//! │  │  partner_id, kind   │   │  FlatMonthly..│   │                 │     │
//! │  │  amount, date       │   │  CustomLump.. │   │                 │     │
//! │  └─────────────────────┘   └───────────────┘   └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Immutability
//! Sales and installments never change their economic terms after creation.
//! Only `Installment::status`/`paid_date` and `Sale::status` move, and the
//! patch types below only expose those fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Partner
// =============================================================================

/// A capital contributor.
///
/// Partners are never hard-deleted: leaving stamps `leave_date`, and the
/// record stays visible for events that predate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Partner {
    pub id: String,
    pub name: String,

    /// Committed principal. Changes only through capital transactions.
    pub capital: Money,

    /// Capital not tied up in outstanding purchases. `0 ≤ available ≤ capital`.
    pub available_capital: Money,

    /// Accrued margin-on-sale profit.
    pub initial_profit: Money,

    /// Accrued interest-on-installment profit.
    pub monthly_profit: Money,

    /// Stored share of total capital, in percent.
    pub share_percent: f64,

    #[ts(as = "String")]
    pub join_date: NaiveDate,

    /// Set when the partner leaves (soft delete).
    #[ts(as = "Option<String>")]
    pub leave_date: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Partner {
    /// A partner is active on `date` iff `join_date ≤ date < leave_date`.
    pub fn is_active_at(&self, date: NaiveDate) -> bool {
        self.join_date <= date && self.leave_date.map_or(true, |leave| leave > date)
    }

    /// Capital currently tied up in purchases.
    #[inline]
    pub fn used_capital(&self) -> Money {
        self.capital - self.available_capital
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        self.initial_profit + self.monthly_profit
    }
}

// =============================================================================
// Interest Policy
// =============================================================================

/// How interest is charged on the financed part of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InterestPolicy {
    /// Monthly rate on the outstanding balance before each period's principal.
    DecliningBalance,
    /// Monthly rate on the original financed amount, every period.
    FlatMonthlyOnOriginal,
    /// One rate over the whole term, not compounding.
    CustomLumpSum,
}

impl std::fmt::Display for InterestPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterestPolicy::DecliningBalance => write!(f, "declining_balance"),
            InterestPolicy::FlatMonthlyOnOriginal => write!(f, "flat_monthly_on_original"),
            InterestPolicy::CustomLumpSum => write!(f, "custom_lump_sum"),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// The status of an installment sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Installments still outstanding.
    Active,
    /// Every installment paid.
    Completed,
    /// Customer stopped paying.
    Defaulted,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Active
    }
}

/// A phone sold on an installment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: String,
    pub phone_id: String,

    /// What the business paid for the phone.
    pub purchase_price: Money,

    /// Price quoted to the customer.
    pub announced_price: Money,

    pub down_payment: Money,
    pub term_months: u32,
    pub interest_policy: InterestPolicy,

    /// Only meaningful for [`InterestPolicy::CustomLumpSum`] (or an
    /// overridden declining-balance rate).
    pub custom_rate: Option<Rate>,

    /// `announced_price − purchase_price`, frozen at sale time.
    pub initial_profit: Money,

    #[ts(as = "String")]
    pub sale_date: NaiveDate,

    pub status: SaleStatus,
}

impl Sale {
    /// The financed part: `announced_price − down_payment`.
    #[inline]
    pub fn remaining_amount(&self) -> Money {
        self.announced_price - self.down_payment
    }
}

// =============================================================================
// Installment
// =============================================================================

/// Payment state of a single installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
}

impl Default for InstallmentStatus {
    fn default() -> Self {
        InstallmentStatus::Pending
    }
}

/// One period of a sale's repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Installment {
    pub id: String,
    pub sale_id: String,

    /// 1-based position in the schedule.
    pub sequence: u32,

    pub principal_amount: Money,
    pub interest_amount: Money,

    /// `principal_amount + interest_amount`.
    pub total_amount: Money,

    /// Outstanding principal after this installment is paid.
    pub remaining_debt_after: Money,

    #[ts(as = "String")]
    pub due_date: NaiveDate,

    #[ts(as = "Option<String>")]
    pub paid_date: Option<NaiveDate>,

    pub status: InstallmentStatus,
}

impl Installment {
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }
}

// =============================================================================
// Capital Transactions
// =============================================================================

/// What a partner-level money movement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// New money in: capital and available capital both grow.
    CapitalAdd,
    /// Money out of idle capital: capital and available capital both shrink.
    CapitalWithdraw,
    InitialProfitWithdraw,
    MonthlyProfitWithdraw,
    /// Accrued initial profit is reinvested as capital.
    InitialProfitToCapital,
    /// Accrued monthly profit is reinvested as capital.
    MonthlyProfitToCapital,
}

impl TransactionKind {
    /// Signed change this transaction makes to the partner's capital.
    pub fn capital_delta(&self, amount: Money) -> Money {
        match self {
            TransactionKind::CapitalAdd
            | TransactionKind::InitialProfitToCapital
            | TransactionKind::MonthlyProfitToCapital => amount,
            TransactionKind::CapitalWithdraw => -amount,
            TransactionKind::InitialProfitWithdraw | TransactionKind::MonthlyProfitWithdraw => {
                Money::zero()
            }
        }
    }

    /// Amount this transaction takes out of accrued initial profit.
    pub fn initial_profit_outflow(&self, amount: Money) -> Money {
        match self {
            TransactionKind::InitialProfitWithdraw | TransactionKind::InitialProfitToCapital => {
                amount
            }
            _ => Money::zero(),
        }
    }

    /// Amount this transaction takes out of accrued monthly profit.
    pub fn monthly_profit_outflow(&self, amount: Money) -> Money {
        match self {
            TransactionKind::MonthlyProfitWithdraw | TransactionKind::MonthlyProfitToCapital => {
                amount
            }
            _ => Money::zero(),
        }
    }
}

/// A dated money movement on one partner's account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CapitalTransaction {
    pub id: String,
    pub partner_id: String,
    pub kind: TransactionKind,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub description: String,
}

// =============================================================================
// Partial Updates
// =============================================================================

/// Fields of a partner that may be overwritten. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartnerPatch {
    pub capital: Option<Money>,
    pub available_capital: Option<Money>,
    pub initial_profit: Option<Money>,
    pub monthly_profit: Option<Money>,
    pub share_percent: Option<f64>,
    pub leave_date: Option<NaiveDate>,
}

impl PartnerPatch {
    pub fn is_empty(&self) -> bool {
        *self == PartnerPatch::default()
    }

    /// Applies the patch to an in-memory record.
    pub fn apply_to(&self, partner: &mut Partner) {
        if let Some(v) = self.capital {
            partner.capital = v;
        }
        if let Some(v) = self.available_capital {
            partner.available_capital = v;
        }
        if let Some(v) = self.initial_profit {
            partner.initial_profit = v;
        }
        if let Some(v) = self.monthly_profit {
            partner.monthly_profit = v;
        }
        if let Some(v) = self.share_percent {
            partner.share_percent = v;
        }
        if let Some(v) = self.leave_date {
            partner.leave_date = Some(v);
        }
    }
}

/// The only mutable field of a sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalePatch {
    pub status: Option<SaleStatus>,
}

/// The mutable fields of an installment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPatch {
    pub status: Option<InstallmentStatus>,
    pub paid_date: Option<NaiveDate>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn partner(join: NaiveDate, leave: Option<NaiveDate>) -> Partner {
        Partner {
            id: "p1".to_string(),
            name: "Ali".to_string(),
            capital: Money::from_units(100),
            available_capital: Money::from_units(60),
            initial_profit: Money::from_units(5),
            monthly_profit: Money::from_units(7),
            share_percent: 100.0,
            join_date: join,
            leave_date: leave,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_active_at_boundaries() {
        let p = partner(date(2024, 1, 10), Some(date(2024, 6, 1)));

        assert!(!p.is_active_at(date(2024, 1, 9)));
        assert!(p.is_active_at(date(2024, 1, 10)));
        assert!(p.is_active_at(date(2024, 5, 31)));
        // leave_date itself is excluded
        assert!(!p.is_active_at(date(2024, 6, 1)));
    }

    #[test]
    fn test_partner_derived_figures() {
        let p = partner(date(2024, 1, 1), None);
        assert_eq!(p.used_capital().units(), 40);
        assert_eq!(p.total_profit().units(), 12);
        assert!(p.is_active_at(date(2030, 1, 1)));
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut p = partner(date(2024, 1, 1), None);
        let patch = PartnerPatch {
            monthly_profit: Some(Money::from_units(50)),
            leave_date: Some(date(2025, 1, 1)),
            ..Default::default()
        };
        patch.apply_to(&mut p);

        assert_eq!(p.monthly_profit.units(), 50);
        assert_eq!(p.initial_profit.units(), 5);
        assert_eq!(p.leave_date, Some(date(2025, 1, 1)));
        assert!(PartnerPatch::default().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_transaction_kind_effects() {
        let amount = Money::from_units(10);
        assert_eq!(TransactionKind::CapitalAdd.capital_delta(amount).units(), 10);
        assert_eq!(TransactionKind::CapitalWithdraw.capital_delta(amount).units(), -10);
        assert_eq!(
            TransactionKind::MonthlyProfitToCapital.capital_delta(amount).units(),
            10
        );
        assert_eq!(
            TransactionKind::MonthlyProfitToCapital
                .monthly_profit_outflow(amount)
                .units(),
            10
        );
        assert!(TransactionKind::InitialProfitWithdraw
            .capital_delta(amount)
            .is_zero());
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(SaleStatus::default(), SaleStatus::Active);
        assert_eq!(InstallmentStatus::default(), InstallmentStatus::Pending);
    }
}
