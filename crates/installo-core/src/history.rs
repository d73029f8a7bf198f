//! # Partnership History
//!
//! Answers "who was a partner on date D, and with how much capital?".
//!
//! Every allocation in the ledger is made against the partner set of the
//! event's own date (sale date, installment due date), not today's roster.
//! A partner who joins after a sale gets nothing from it; a partner who left
//! before a sale is excluded from it but keeps what they earned earlier.
//!
//! ## Index Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dates = { join/leave dates } ∪ { sale dates } ∪ { due dates }         │
//! │                                                                         │
//! │  2024-01-01 ──► [A: 60M, B: 40M]                                       │
//! │  2024-02-15 ──► [A: 60M, B: 40M]          (sale)                       │
//! │  2024-03-01 ──► [A: 60M, B: 40M, C: 50M]  (C joins)                    │
//! │  2024-06-01 ──► [A: 60M, C: 50M]          (B leaves)                   │
//! │                                                                         │
//! │  partners_active_at(d): index hit, else direct evaluation              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Capital on a past date is the current capital with every later capital
//! transaction undone, floored at zero.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::Weight;
use crate::money::Money;
use crate::types::{CapitalTransaction, Installment, Partner, Sale};

/// A partner as they stood on a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerSnapshot {
    pub id: String,
    pub capital: Money,
}

/// Date → active partner set, rebuilt from the full roster on demand.
#[derive(Debug, Clone, Default)]
pub struct PartnershipHistory {
    partners: Vec<Partner>,
    transactions: Vec<CapitalTransaction>,
    index: BTreeMap<NaiveDate, Vec<PartnerSnapshot>>,
}

impl PartnershipHistory {
    /// Builds the index from every partner (including those who left) and
    /// every dated event.
    pub fn build(
        partners: &[Partner],
        sales: &[Sale],
        installments: &[Installment],
        transactions: &[CapitalTransaction],
    ) -> Self {
        let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for partner in partners {
            dates.insert(partner.join_date);
            if let Some(leave) = partner.leave_date {
                dates.insert(leave);
            }
        }
        dates.extend(sales.iter().map(|s| s.sale_date));
        dates.extend(installments.iter().map(|i| i.due_date));

        let mut history = PartnershipHistory {
            partners: partners.to_vec(),
            transactions: transactions.to_vec(),
            index: BTreeMap::new(),
        };

        let index = dates
            .into_iter()
            .map(|date| (date, history.evaluate(date)))
            .collect();
        history.index = index;
        history
    }

    /// Partners active on `date`, in roster order.
    pub fn partners_active_at(&self, date: NaiveDate) -> Vec<PartnerSnapshot> {
        match self.index.get(&date) {
            Some(snapshots) => snapshots.clone(),
            None => self.evaluate(date),
        }
    }

    /// Active partners on `date` as allocator weights (capital at that date).
    pub fn weights_at(&self, date: NaiveDate) -> Vec<Weight> {
        self.partners_active_at(date)
            .into_iter()
            .map(|s| Weight::new(s.id, s.capital.units()))
            .collect()
    }

    /// Σ capital of the partners active on `date`.
    pub fn total_capital_at(&self, date: NaiveDate) -> Money {
        self.partners_active_at(date).iter().map(|s| s.capital).sum()
    }

    /// The indexed dates, ascending.
    #[cfg(test)]
    pub(crate) fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.index.keys()
    }

    /// Capital of one partner as of `date`.
    pub fn capital_at(&self, partner: &Partner, date: NaiveDate) -> Money {
        let undone: Money = self
            .transactions
            .iter()
            .filter(|t| t.partner_id == partner.id && t.date > date)
            .map(|t| t.kind.capital_delta(t.amount))
            .sum();
        (partner.capital - undone).floor_zero()
    }

    fn evaluate(&self, date: NaiveDate) -> Vec<PartnerSnapshot> {
        self.partners
            .iter()
            .filter(|p| p.is_active_at(date))
            .map(|p| PartnerSnapshot {
                id: p.id.clone(),
                capital: self.capital_at(p, date),
            })
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
