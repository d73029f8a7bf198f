//! Shared builders for the repository and store tests.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use installo_core::{
    plan_sale, InterestPolicy, Money, Partner, PlannedSale, SaleDraft, ScheduleSettings,
};

use crate::{Database, DbConfig};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn partner(name: &str, capital: i64, join: NaiveDate) -> Partner {
    Partner {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        capital: Money::from_units(capital),
        available_capital: Money::from_units(capital),
        initial_profit: Money::zero(),
        monthly_profit: Money::zero(),
        share_percent: 0.0,
        join_date: join,
        leave_date: None,
        created_at: Utc::now(),
    }
}

/// A sale financing all of `announced`, bought at 90% of it.
pub(crate) fn planned_sale(
    announced: i64,
    term_months: u32,
    policy: InterestPolicy,
    on: NaiveDate,
) -> PlannedSale {
    let draft = SaleDraft {
        customer_id: Uuid::new_v4().to_string(),
        phone_id: Uuid::new_v4().to_string(),
        purchase_price: Money::from_units(announced * 9 / 10),
        announced_price: Money::from_units(announced),
        down_payment: Money::zero(),
        term_months,
        interest_policy: policy,
        custom_rate: None,
        sale_date: on,
    };
    plan_sale(&draft, &ScheduleSettings::default()).unwrap()
}
