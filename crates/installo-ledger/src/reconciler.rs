//! # Financial Reconciler
//!
//! Detects drift between stored partner balances and the event history,
//! repairs it with a full recomputation, and reports what is left.
//!
//! ## Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (a) Σ capital − Σ available   vs  Σ purchase − Σ paid principal       │
//! │  (b) capital / roster capital  vs  stored share_percent (per partner)  │
//! │  (c) Σ initial_profit          vs  Σ sale margin − initial outflows    │
//! │  (d) Σ monthly_profit          vs  Σ paid interest − monthly outflows  │
//! │  (e) 0 ≤ available ≤ capital   (per partner)                           │
//! │                                                                         │
//! │  any breach ──► recompute_all ──► check again ──► unresolved           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A breach that survives recomputation is reported, not retried.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use installo_core::{InstallmentStatus, Money, Partner, SaleStatus};

use crate::config::ReconciliationConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{
    expected_share, roster_capital, summarize, CapitalLedger, FinancialSummary, LedgerData,
};

// =============================================================================
// Findings
// =============================================================================

/// One disagreement between stored and derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum DriftWarning {
    UsedCapital { recorded: Money, expected: Money },
    SharePercent { partner_id: String, recorded: f64, expected: f64 },
    InitialProfit { recorded: Money, expected: Money },
    MonthlyProfit { recorded: Money, expected: Money },
    AvailableOutOfRange { partner_id: String, available: Money, capital: Money },
}

impl fmt::Display for DriftWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftWarning::UsedCapital { recorded, expected } => {
                write!(f, "used capital is {recorded}, sales say {expected}")
            }
            DriftWarning::SharePercent { partner_id, recorded, expected } => write!(
                f,
                "partner {partner_id} share is {recorded:.2}%, capital says {expected:.2}%"
            ),
            DriftWarning::InitialProfit { recorded, expected } => {
                write!(f, "initial profit is {recorded}, sales say {expected}")
            }
            DriftWarning::MonthlyProfit { recorded, expected } => {
                write!(f, "monthly profit is {recorded}, paid interest says {expected}")
            }
            DriftWarning::AvailableOutOfRange { partner_id, available, capital } => write!(
                f,
                "partner {partner_id} has {available} available against {capital} capital"
            ),
        }
    }
}

/// A stored value overwritten by recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub partner_id: String,
    pub field: String,
    pub before: String,
    pub after: String,
}

/// Outcome of [`FinancialReconciler::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// True when nothing is left unresolved.
    pub is_valid: bool,
    /// Everything found before repair.
    pub warnings: Vec<DriftWarning>,
    pub corrections: Vec<Correction>,
    /// Still wrong after recomputation.
    pub unresolved: Vec<DriftWarning>,
    pub checked_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Turns remaining drift into an error.
    pub fn into_result(self) -> LedgerResult<Self> {
        if self.unresolved.is_empty() {
            Ok(self)
        } else {
            Err(LedgerError::UnresolvedInconsistency {
                warnings: self.unresolved,
            })
        }
    }
}

/// Business-level overview plus the validation that preceded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub summary: FinancialSummary,
    /// Used capital as a percentage of total capital.
    pub capital_utilization: f64,
    /// Total profit as a percentage of total capital.
    pub profit_margin: f64,
    pub sales: usize,
    pub active_sales: usize,
    pub completed_sales: usize,
    pub defaulted_sales: usize,
    pub installments: usize,
    pub paid_installments: usize,
    pub pending_installments: usize,
    pub overdue_installments: usize,
    /// Paid installments as a percentage of all installments.
    pub collection_rate: f64,
    pub collected: Money,
    pub outstanding: Money,
    pub validation: ReconciliationReport,
}

// =============================================================================
// Reconciler
// =============================================================================

#[derive(Debug, Clone)]
pub struct FinancialReconciler {
    ledger: CapitalLedger,
}

impl FinancialReconciler {
    pub fn new(ledger: CapitalLedger) -> Self {
        FinancialReconciler { ledger }
    }

    /// Runs every check, recomputes on any breach and checks again.
    pub async fn validate(&self) -> LedgerResult<ReconciliationReport> {
        let tolerance = &self.ledger.config().reconciliation;
        let before = self.ledger.load_all().await?;
        let warnings = detect_drift(&before, tolerance);

        if warnings.is_empty() {
            info!(partners = before.partners.len(), "Financial data consistent");
            return Ok(ReconciliationReport {
                is_valid: true,
                warnings,
                corrections: Vec::new(),
                unresolved: Vec::new(),
                checked_at: Utc::now(),
            });
        }

        for warning in &warnings {
            warn!(%warning, "Drift detected");
        }

        self.ledger.recompute_all().await?;

        let after = self.ledger.load_all().await?;
        let corrections = diff_partners(&before.partners, &after.partners);
        let unresolved = detect_drift(&after, tolerance);

        for warning in &unresolved {
            warn!(%warning, "Drift persists after recomputation");
        }
        info!(
            found = warnings.len(),
            corrected = corrections.len(),
            unresolved = unresolved.len(),
            "Reconciliation finished"
        );

        Ok(ReconciliationReport {
            is_valid: unresolved.is_empty(),
            warnings,
            corrections,
            unresolved,
            checked_at: Utc::now(),
        })
    }

    /// Validates, then summarizes the repaired state.
    pub async fn report(&self) -> LedgerResult<FinancialReport> {
        let validation = self.validate().await?;
        let data = self.ledger.load_all().await?;
        let summary = summarize(&data.partners);

        let count_sales = |status: SaleStatus| data.sales.iter().filter(|s| s.status == status).count();
        let count_installments =
            |status: InstallmentStatus| data.installments.iter().filter(|i| i.status == status).count();

        let paid_installments = count_installments(InstallmentStatus::Paid);
        let collected: Money = data
            .installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.total_amount)
            .sum();
        let outstanding: Money = data
            .installments
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| i.total_amount)
            .sum();

        Ok(FinancialReport {
            capital_utilization: percent(summary.total_used, summary.total_capital),
            profit_margin: percent(summary.total_profit, summary.total_capital),
            sales: data.sales.len(),
            active_sales: count_sales(SaleStatus::Active),
            completed_sales: count_sales(SaleStatus::Completed),
            defaulted_sales: count_sales(SaleStatus::Defaulted),
            installments: data.installments.len(),
            paid_installments,
            pending_installments: count_installments(InstallmentStatus::Pending),
            overdue_installments: count_installments(InstallmentStatus::Overdue),
            collection_rate: if data.installments.is_empty() {
                0.0
            } else {
                paid_installments as f64 / data.installments.len() as f64 * 100.0
            },
            collected,
            outstanding,
            summary,
            validation,
        })
    }
}

// =============================================================================
// Checks
// =============================================================================

fn detect_drift(data: &LedgerData, tolerance: &ReconciliationConfig) -> Vec<DriftWarning> {
    let mut warnings = Vec::new();
    let off = |recorded: Money, expected: Money| {
        (recorded - expected).abs().units() > tolerance.amount_tolerance
    };

    // (a)
    let recorded_used: Money = data.partners.iter().map(|p| p.used_capital()).sum();
    let purchased: Money = data.sales.iter().map(|s| s.purchase_price).sum();
    let repaid: Money = data
        .installments
        .iter()
        .filter(|i| i.is_paid())
        .map(|i| i.principal_amount)
        .sum();
    if off(recorded_used, purchased - repaid) {
        warnings.push(DriftWarning::UsedCapital {
            recorded: recorded_used,
            expected: purchased - repaid,
        });
    }

    // (b)
    let roster = roster_capital(&data.partners);
    for partner in &data.partners {
        let expected = expected_share(partner, roster);
        if (partner.share_percent - expected).abs() > tolerance.share_tolerance {
            warnings.push(DriftWarning::SharePercent {
                partner_id: partner.id.clone(),
                recorded: partner.share_percent,
                expected,
            });
        }
    }

    // (c)
    let recorded_initial: Money = data.partners.iter().map(|p| p.initial_profit).sum();
    let expected_initial = data.sales.iter().map(|s| s.initial_profit).sum::<Money>()
        - data
            .transactions
            .iter()
            .map(|t| t.kind.initial_profit_outflow(t.amount))
            .sum::<Money>();
    if off(recorded_initial, expected_initial) {
        warnings.push(DriftWarning::InitialProfit {
            recorded: recorded_initial,
            expected: expected_initial,
        });
    }

    // (d)
    let recorded_monthly: Money = data.partners.iter().map(|p| p.monthly_profit).sum();
    let expected_monthly = data
        .installments
        .iter()
        .filter(|i| i.is_paid())
        .map(|i| i.interest_amount)
        .sum::<Money>()
        - data
            .transactions
            .iter()
            .map(|t| t.kind.monthly_profit_outflow(t.amount))
            .sum::<Money>();
    if off(recorded_monthly, expected_monthly) {
        warnings.push(DriftWarning::MonthlyProfit {
            recorded: recorded_monthly,
            expected: expected_monthly,
        });
    }

    // (e)
    for partner in &data.partners {
        if partner.available_capital.is_negative() || partner.available_capital > partner.capital {
            warnings.push(DriftWarning::AvailableOutOfRange {
                partner_id: partner.id.clone(),
                available: partner.available_capital,
                capital: partner.capital,
            });
        }
    }

    warnings
}

fn diff_partners(before: &[Partner], after: &[Partner]) -> Vec<Correction> {
    let mut corrections = Vec::new();

    for old in before {
        let Some(new) = after.iter().find(|p| p.id == old.id) else {
            continue;
        };
        let mut record = |field: &str, before: String, after: String| {
            if before != after {
                corrections.push(Correction {
                    partner_id: old.id.clone(),
                    field: field.to_string(),
                    before,
                    after,
                });
            }
        };

        record(
            "available_capital",
            old.available_capital.to_string(),
            new.available_capital.to_string(),
        );
        record(
            "initial_profit",
            old.initial_profit.to_string(),
            new.initial_profit.to_string(),
        );
        record(
            "monthly_profit",
            old.monthly_profit.to_string(),
            new.monthly_profit.to_string(),
        );
        record(
            "share_percent",
            format!("{:.2}", old.share_percent),
            format!("{:.2}", new.share_percent),
        );
    }

    corrections
}

fn percent(part: Money, whole: Money) -> f64 {
    if whole.is_positive() {
        part.units() as f64 / whole.units() as f64 * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
