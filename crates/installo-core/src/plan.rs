//! # Sale Planning
//!
//! Turns a [`SaleDraft`] into the records that get persisted: one [`Sale`]
//! and `term_months` [`Installment`]s with due dates one calendar month
//! apart, starting one month after the sale date.
//!
//! Planning is pure. Checking that partners can fund the purchase is the
//! ledger's job.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::amortization::{compute_schedule, Schedule, ScheduleSettings};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::types::{Installment, InstallmentStatus, InterestPolicy, Sale, SaleStatus};
use crate::validation::{validate_sale_prices, validate_uuid};

/// Everything needed to register a new installment sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    pub customer_id: String,
    pub phone_id: String,
    pub purchase_price: Money,
    pub announced_price: Money,
    pub down_payment: Money,
    pub term_months: u32,
    pub interest_policy: InterestPolicy,
    pub custom_rate: Option<Rate>,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
}

/// A sale ready to be written, with its schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSale {
    pub sale: Sale,
    pub installments: Vec<Installment>,
    pub schedule: Schedule,
}

/// Validates a draft and builds its sale and installment records.
///
/// ## Errors
/// - `CoreError::Validation` for bad prices, ids, term or rate
/// - `CoreError::InvalidSchedule` if a due date cannot be represented
pub fn plan_sale(draft: &SaleDraft, settings: &ScheduleSettings) -> CoreResult<PlannedSale> {
    validate_uuid(&draft.customer_id)?;
    validate_uuid(&draft.phone_id)?;
    validate_sale_prices(draft.purchase_price, draft.announced_price, draft.down_payment)?;

    let remaining = draft.announced_price - draft.down_payment;
    let schedule = compute_schedule(
        remaining,
        draft.term_months,
        draft.interest_policy,
        draft.custom_rate,
        settings,
    )?;

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        customer_id: draft.customer_id.clone(),
        phone_id: draft.phone_id.clone(),
        purchase_price: draft.purchase_price,
        announced_price: draft.announced_price,
        down_payment: draft.down_payment,
        term_months: draft.term_months,
        interest_policy: draft.interest_policy,
        custom_rate: match draft.interest_policy {
            InterestPolicy::FlatMonthlyOnOriginal => None,
            _ => draft.custom_rate,
        },
        initial_profit: draft.announced_price - draft.purchase_price,
        sale_date: draft.sale_date,
        status: SaleStatus::Active,
    };

    let installments = schedule
        .installments
        .iter()
        .map(|period| {
            Ok(Installment {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                sequence: period.sequence,
                principal_amount: period.principal,
                interest_amount: period.interest,
                total_amount: period.total,
                remaining_debt_after: period.remaining_debt_after,
                due_date: due_date(draft.sale_date, period.sequence)?,
                paid_date: None,
                status: InstallmentStatus::Pending,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(PlannedSale {
        sale,
        installments,
        schedule,
    })
}

/// The due date of the `sequence`-th installment of a sale.
///
/// Month-end sale dates clamp to the last day of shorter months
/// (Jan 31 → Feb 29 → Mar 31 ...), as chrono's month arithmetic does.
pub fn due_date(sale_date: NaiveDate, sequence: u32) -> CoreResult<NaiveDate> {
    sale_date
        .checked_add_months(Months::new(sequence))
        .ok_or_else(|| CoreError::InvalidSchedule {
            reason: format!("due date {sequence} months after {sale_date} is out of range"),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> SaleDraft {
        SaleDraft {
            customer_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            phone_id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string(),
            purchase_price: Money::from_units(20_000_000),
            announced_price: Money::from_units(22_000_000),
            down_payment: Money::from_units(7_000_000),
            term_months: 10,
            interest_policy: InterestPolicy::DecliningBalance,
            custom_rate: None,
            sale_date: date(2024, 1, 31),
        }
    }

    #[test]
    fn test_plan_builds_sale_and_installments() {
        let planned = plan_sale(&draft(), &ScheduleSettings::default()).unwrap();

        assert_eq!(planned.sale.initial_profit.units(), 2_000_000);
        assert_eq!(planned.sale.remaining_amount().units(), 15_000_000);
        assert_eq!(planned.sale.status, SaleStatus::Active);
        assert_eq!(planned.installments.len(), 10);

        let first = &planned.installments[0];
        assert_eq!(first.sale_id, planned.sale.id);
        assert_eq!(first.interest_amount.units(), 600_000);
        assert_eq!(first.total_amount.units(), 2_100_000);
        assert_eq!(first.status, InstallmentStatus::Pending);

        let principal: Money = planned.installments.iter().map(|i| i.principal_amount).sum();
        assert_eq!(principal.units(), 15_000_000);
    }

    #[test]
    fn test_due_dates_clamp_to_month_end() {
        let planned = plan_sale(&draft(), &ScheduleSettings::default()).unwrap();
        let dues: Vec<NaiveDate> = planned.installments.iter().take(3).map(|i| i.due_date).collect();
        assert_eq!(dues, vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]);
    }

    #[test]
    fn test_down_payment_must_leave_something_financed() {
        let mut d = draft();
        d.down_payment = d.announced_price;
        let err = plan_sale(&d, &ScheduleSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_flat_plan_drops_custom_rate() {
        let mut d = draft();
        d.interest_policy = InterestPolicy::FlatMonthlyOnOriginal;
        d.custom_rate = Some(Rate::from_bps(900));
        let planned = plan_sale(&d, &ScheduleSettings::default()).unwrap();
        assert_eq!(planned.sale.custom_rate, None);
    }

    #[test]
    fn test_draft_json_shape() {
        let json = serde_json::to_value(draft()).unwrap();
        assert_eq!(json["interest_policy"], "declining_balance");
        assert_eq!(json["purchase_price"], 20_000_000);
        assert_eq!(json["sale_date"], "2024-01-31");
    }
}
