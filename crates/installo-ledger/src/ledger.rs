//! # Capital Ledger
//!
//! Applies sale and installment events to partner balances.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Capital Ledger                                  │
//! │                                                                         │
//! │  SALE (sale_date)                                                      │
//! │  ─────────────────                                                     │
//! │  check_availability ──► apply_purchase ──► apply_initial_profit        │
//! │   Σ available of         available −=        initial_profit +=         │
//! │   partners active         portion by          portion by               │
//! │   on sale_date            capital share       capital share            │
//! │                                                                         │
//! │  INSTALLMENT PAID (weights from due_date)                              │
//! │  ──────────────────────────────────────────                            │
//! │  apply_installment_payment                                             │
//! │   available += principal portion (capped at capital)                   │
//! │   monthly_profit += interest portion                                   │
//! │                                                                         │
//! │  RECOMPUTE (idempotent)                                                │
//! │  ──────────────────────                                                │
//! │  recompute_all: replay every sale and paid installment from zero       │
//! │  and overwrite the stored balances of every partner                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! Incremental operations are read-then-write sequences over the store and
//! are not atomic across partners. A failure partway through is reported as
//! [`LedgerError::PartialApplication`] and never retried here. Stored
//! balances are a cache; the event history is the source of truth and
//! [`CapitalLedger::recompute_all`] rebuilds the cache from it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use installo_core::validation::{
    validate_non_negative_amount, validate_partner_name, validate_positive_amount,
};
use installo_core::{
    allocate, plan_sale, CapitalTransaction, Installment, InstallmentPatch, InstallmentStatus,
    Money, Partner, PartnerPatch, PartnershipHistory, PlannedSale, Portion, Sale, SaleDraft,
    SalePatch, SaleStatus, ScheduleSettings, TransactionKind, ValidationError, Weight,
};

use crate::config::EngineConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

// =============================================================================
// Results
// =============================================================================

/// Whether the partners active on a date can fund a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub requested: Money,
    pub available: Money,
    /// `max(requested − available, 0)`.
    pub shortfall: Money,
    pub is_available: bool,
    pub as_of: NaiveDate,
    /// Number of partners active on `as_of`.
    pub partners: usize,
}

/// How one installment payment was split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub principal: Vec<Portion>,
    pub interest: Vec<Portion>,
}

/// Outcome of [`CapitalLedger::recompute_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub partners: usize,
    pub sales: usize,
    pub paid_installments: usize,
    pub total_available: Money,
    pub total_initial_profit: Money,
    pub total_monthly_profit: Money,
}

/// One partner's line in the financial summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerSummary {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub capital: Money,
    pub available_capital: Money,
    pub used_capital: Money,
    pub share_percent: f64,
    pub initial_profit: Money,
    pub monthly_profit: Money,
    pub total_profit: Money,
}

/// Totals across the whole partner set (retired partners included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_capital: Money,
    pub total_available: Money,
    pub total_used: Money,
    pub total_initial_profit: Money,
    pub total_monthly_profit: Money,
    pub total_profit: Money,
    pub partners: Vec<PartnerSummary>,
}

/// Everything the store holds, loaded in one pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerData {
    pub partners: Vec<Partner>,
    pub sales: Vec<Sale>,
    pub installments: Vec<Installment>,
    pub transactions: Vec<CapitalTransaction>,
}

impl LedgerData {
    pub fn history(&self) -> PartnershipHistory {
        PartnershipHistory::build(
            &self.partners,
            &self.sales,
            &self.installments,
            &self.transactions,
        )
    }
}

// =============================================================================
// Capital Ledger
// =============================================================================

/// Partner balance bookkeeping over an injected store.
#[derive(Clone)]
pub struct CapitalLedger {
    store: Arc<dyn LedgerStore>,
    config: EngineConfig,
}

impl std::fmt::Debug for CapitalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapitalLedger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CapitalLedger {
    pub fn new(store: Arc<dyn LedgerStore>, config: EngineConfig) -> Self {
        CapitalLedger { store, config }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schedule_settings(&self) -> ScheduleSettings {
        self.config.schedule.to_settings()
    }

    // =========================================================================
    // Availability
    // =========================================================================

    /// Σ available capital of partners active on `as_of` (default: today)
    /// against `price`.
    pub async fn check_availability(
        &self,
        price: Money,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<Availability> {
        let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let partners = self.store.list_partners(true).await?;
        Ok(availability_of(&partners, price, as_of))
    }

    // =========================================================================
    // Incremental Operations
    // =========================================================================

    /// Deducts a purchase from the available capital of the partners active
    /// on `sale_date`, split by their capital on that date.
    ///
    /// ## Errors
    /// - `Validation` if `price ≤ 0`
    /// - `InsufficientCapital` if the active partners cannot fund it; nothing
    ///   is written in that case
    /// - `PartialApplication` if the store fails after some partners were
    ///   updated
    pub async fn apply_purchase(
        &self,
        price: Money,
        sale_date: NaiveDate,
    ) -> LedgerResult<Vec<Portion>> {
        validate_positive_amount("purchase_price", price)?;

        let partners = self.store.list_partners(true).await?;
        let availability = availability_of(&partners, price, sale_date);
        if !availability.is_available {
            return Err(insufficient_capital(&availability));
        }

        let transactions = self.store.list_transactions().await?;
        let history = PartnershipHistory::build(&partners, &[], &[], &transactions);
        let portions = allocate(price, &history.weights_at(sale_date));

        self.apply_writes("apply_purchase", purchase_writes(&partners, &portions))
            .await?;

        info!(price = %price, %sale_date, partners = portions.len(), "Purchase applied");
        Ok(portions)
    }

    /// Returns principal to, and credits interest to, the partners active on
    /// the installment's due date.
    pub async fn apply_installment_payment(
        &self,
        principal: Money,
        interest: Money,
        due_date: NaiveDate,
    ) -> LedgerResult<PaymentAllocation> {
        validate_non_negative_amount("principal", principal)?;
        validate_non_negative_amount("interest", interest)?;

        let partners = self.store.list_partners(true).await?;
        let transactions = self.store.list_transactions().await?;
        let history = PartnershipHistory::build(&partners, &[], &[], &transactions);
        let allocation = split_payment(principal, interest, due_date, &history.weights_at(due_date));

        self.apply_writes("apply_installment_payment", payment_writes(&partners, &allocation))
            .await?;

        info!(%principal, %interest, %due_date, "Installment payment applied");
        Ok(allocation)
    }

    /// Credits a sale's margin to the partners active on the sale date.
    pub async fn apply_initial_profit(
        &self,
        profit: Money,
        sale_date: NaiveDate,
    ) -> LedgerResult<Vec<Portion>> {
        validate_non_negative_amount("initial_profit", profit)?;

        let partners = self.store.list_partners(true).await?;
        let transactions = self.store.list_transactions().await?;
        let history = PartnershipHistory::build(&partners, &[], &[], &transactions);
        let portions = allocate(profit, &history.weights_at(sale_date));

        self.apply_writes("apply_initial_profit", initial_profit_writes(&partners, &portions))
            .await?;

        info!(%profit, %sale_date, "Initial profit applied");
        Ok(portions)
    }

    // =========================================================================
    // Full Recomputation
    // =========================================================================

    /// Rebuilds every partner's available capital, profits and share from
    /// the event history and overwrites the stored values. Active sales with
    /// every installment paid are marked completed.
    ///
    /// Reads all events first and only then writes final values, so running
    /// it twice, or concurrently with itself, converges on the same state.
    pub async fn recompute_all(&self) -> LedgerResult<RecomputeSummary> {
        let data = self.load_all().await?;
        let derived = derive_balances(&data);

        let mut writes: Vec<Write> = derived
            .iter()
            .map(|d| Write::Partner {
                id: d.id.clone(),
                patch: PartnerPatch {
                    available_capital: Some(d.available_capital),
                    initial_profit: Some(d.initial_profit),
                    monthly_profit: Some(d.monthly_profit),
                    share_percent: Some(d.share_percent),
                    ..PartnerPatch::default()
                },
            })
            .collect();

        // a final payment can stop before its sale is marked completed
        let settled = settled_sales(&data);
        writes.extend(settled.iter().map(|id| Write::Sale {
            id: id.clone(),
            patch: SalePatch {
                status: Some(SaleStatus::Completed),
            },
        }));

        self.apply_writes("recompute_all", writes).await?;
        if !settled.is_empty() {
            info!(count = settled.len(), "Fully paid sales marked completed");
        }

        let summary = RecomputeSummary {
            partners: derived.len(),
            sales: data.sales.len(),
            paid_installments: data.installments.iter().filter(|i| i.is_paid()).count(),
            total_available: derived.iter().map(|d| d.available_capital).sum(),
            total_initial_profit: derived.iter().map(|d| d.initial_profit).sum(),
            total_monthly_profit: derived.iter().map(|d| d.monthly_profit).sum(),
        };

        info!(
            partners = summary.partners,
            sales = summary.sales,
            paid_installments = summary.paid_installments,
            total_available = %summary.total_available,
            "Partner balances recomputed from history"
        );
        Ok(summary)
    }

    // =========================================================================
    // Workflow Operations
    // =========================================================================

    /// Validates and plans a sale, checks capital, stores the sale with its
    /// installments, then applies the purchase and the initial profit.
    ///
    /// The sale row is written first. Once it is stored, a failing partner
    /// write is a `PartialApplication`.
    pub async fn register_sale(&self, draft: SaleDraft) -> LedgerResult<PlannedSale> {
        let planned = plan_sale(&draft, &self.schedule_settings())?;
        let sale = &planned.sale;

        let partners = self.store.list_partners(true).await?;
        let availability = availability_of(&partners, sale.purchase_price, sale.sale_date);
        if !availability.is_available {
            return Err(insufficient_capital(&availability));
        }

        let transactions = self.store.list_transactions().await?;
        let history = PartnershipHistory::build(&partners, &[], &[], &transactions);
        let weights = history.weights_at(sale.sale_date);

        let mut writes = vec![Write::InsertSale {
            sale: sale.clone(),
            installments: planned.installments.clone(),
        }];
        writes.extend(purchase_writes(
            &partners,
            &allocate(sale.purchase_price, &weights),
        ));
        writes.extend(initial_profit_writes(
            &partners,
            &allocate(sale.initial_profit, &weights),
        ));

        self.apply_writes("register_sale", writes).await?;

        info!(
            sale_id = %sale.id,
            policy = %sale.interest_policy,
            purchase_price = %sale.purchase_price,
            total_profit = %planned.schedule.total_profit,
            installments = planned.installments.len(),
            "Sale registered"
        );
        Ok(planned)
    }

    /// Marks an installment paid and credits the partners active on its due
    /// date. Completes the sale when this was its last open installment.
    ///
    /// The installment is marked paid first, so a retry after a
    /// `PartialApplication` gets `AlreadyPaid`; `recompute_all` settles the
    /// missing credits.
    pub async fn pay_installment(
        &self,
        installment_id: &str,
        paid_date: NaiveDate,
    ) -> LedgerResult<Installment> {
        let installments = self.store.list_installments().await?;
        let mut installment = installments
            .iter()
            .find(|i| i.id == installment_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound {
                entity: "installment",
                id: installment_id.to_string(),
            })?;

        if installment.is_paid() {
            return Err(LedgerError::AlreadyPaid {
                installment_id: installment.id,
            });
        }

        let partners = self.store.list_partners(true).await?;
        let transactions = self.store.list_transactions().await?;
        let history = PartnershipHistory::build(&partners, &[], &[], &transactions);
        let allocation = split_payment(
            installment.principal_amount,
            installment.interest_amount,
            installment.due_date,
            &history.weights_at(installment.due_date),
        );

        let mut writes = vec![Write::Installment {
            id: installment.id.clone(),
            patch: InstallmentPatch {
                status: Some(InstallmentStatus::Paid),
                paid_date: Some(paid_date),
            },
        }];
        writes.extend(payment_writes(&partners, &allocation));

        let sale_settled = installments
            .iter()
            .filter(|i| i.sale_id == installment.sale_id)
            .all(|i| i.id == installment.id || i.is_paid());
        if sale_settled {
            writes.push(Write::Sale {
                id: installment.sale_id.clone(),
                patch: SalePatch {
                    status: Some(SaleStatus::Completed),
                },
            });
        }

        self.apply_writes("pay_installment", writes).await?;

        installment.status = InstallmentStatus::Paid;
        installment.paid_date = Some(paid_date);
        info!(
            installment_id = %installment.id,
            principal = %installment.principal_amount,
            interest = %installment.interest_amount,
            "Installment paid"
        );
        if sale_settled {
            info!(sale_id = %installment.sale_id, "Sale completed");
        }

        Ok(installment)
    }

    /// Flags pending installments due before `as_of` as overdue.
    pub async fn mark_overdue(&self, as_of: NaiveDate) -> LedgerResult<usize> {
        let writes: Vec<Write> = self
            .store
            .list_installments()
            .await?
            .into_iter()
            .filter(|i| i.status == InstallmentStatus::Pending && i.due_date < as_of)
            .map(|i| Write::Installment {
                id: i.id,
                patch: InstallmentPatch {
                    status: Some(InstallmentStatus::Overdue),
                    paid_date: None,
                },
            })
            .collect();

        let marked = self.apply_writes("mark_overdue", writes).await?;

        if marked > 0 {
            info!(count = marked, %as_of, "Installments marked overdue");
        }
        Ok(marked)
    }

    /// Adds a partner with fresh capital and no profit.
    pub async fn admit_partner(
        &self,
        name: &str,
        capital: Money,
        join_date: NaiveDate,
    ) -> LedgerResult<Partner> {
        validate_partner_name(name)?;
        validate_positive_amount("capital", capital)?;

        let mut partner = Partner {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            capital,
            available_capital: capital,
            initial_profit: Money::zero(),
            monthly_profit: Money::zero(),
            share_percent: 0.0,
            join_date,
            leave_date: None,
            created_at: Utc::now(),
        };

        let mut roster = self.store.list_partners(true).await?;
        roster.push(partner.clone());
        let (shares, share_updates) = share_writes(&roster);

        let mut writes = vec![Write::InsertPartner(partner.clone())];
        writes.extend(share_updates);
        self.apply_writes("admit_partner", writes).await?;

        if let Some(share) = shares.get(&partner.id) {
            partner.share_percent = *share;
        }
        info!(partner_id = %partner.id, %capital, %join_date, "Partner admitted");
        Ok(partner)
    }

    /// Soft-deletes a partner. They stay in every event that predates
    /// `leave_date`.
    pub async fn retire_partner(&self, partner_id: &str, leave_date: NaiveDate) -> LedgerResult<()> {
        let mut roster = self.store.list_partners(true).await?;
        let partner = find_partner(&mut roster, partner_id)?;

        if let Some(left) = partner.leave_date {
            return Err(ValidationError::Inconsistent {
                field: "leave_date".to_string(),
                reason: format!("partner already left on {left}"),
            }
            .into());
        }
        if leave_date < partner.join_date {
            return Err(ValidationError::Inconsistent {
                field: "leave_date".to_string(),
                reason: format!("{leave_date} is before join date {}", partner.join_date),
            }
            .into());
        }

        let patch = PartnerPatch {
            leave_date: Some(leave_date),
            share_percent: Some(0.0),
            ..PartnerPatch::default()
        };
        patch.apply_to(partner);

        let mut writes = vec![Write::Partner {
            id: partner_id.to_string(),
            patch,
        }];
        writes.extend(share_writes(&roster).1);
        self.apply_writes("retire_partner", writes).await?;

        info!(%partner_id, %leave_date, "Partner retired");
        Ok(())
    }

    /// Records a capital or profit movement on one partner.
    ///
    /// Withdrawals are checked against the balance they draw from before
    /// anything is written. The log entry is written first; the partner
    /// update and any share changes follow it.
    pub async fn record_transaction(
        &self,
        partner_id: &str,
        kind: TransactionKind,
        amount: Money,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> LedgerResult<CapitalTransaction> {
        validate_positive_amount("amount", amount)?;
        let mut roster = self.store.list_partners(true).await?;
        let partner = find_partner(&mut roster, partner_id)?;

        let (balance, held) = match kind {
            TransactionKind::CapitalWithdraw => ("available_capital", partner.available_capital),
            TransactionKind::InitialProfitWithdraw | TransactionKind::InitialProfitToCapital => {
                ("initial_profit", partner.initial_profit)
            }
            TransactionKind::MonthlyProfitWithdraw | TransactionKind::MonthlyProfitToCapital => {
                ("monthly_profit", partner.monthly_profit)
            }
            TransactionKind::CapitalAdd => ("capital", amount),
        };
        if amount > held {
            return Err(LedgerError::InsufficientBalance {
                partner_id: partner.id.clone(),
                balance,
                requested: amount,
                available: held,
            });
        }

        let transaction = CapitalTransaction {
            id: Uuid::new_v4().to_string(),
            partner_id: partner.id.clone(),
            kind,
            amount,
            date,
            description: description.into(),
        };

        let delta = kind.capital_delta(amount);
        let patch = PartnerPatch {
            capital: Some(partner.capital + delta),
            available_capital: Some((partner.available_capital + delta).floor_zero()),
            initial_profit: Some(partner.initial_profit - kind.initial_profit_outflow(amount)),
            monthly_profit: Some(partner.monthly_profit - kind.monthly_profit_outflow(amount)),
            ..PartnerPatch::default()
        };
        patch.apply_to(partner);

        let mut writes = vec![
            Write::InsertTransaction(transaction.clone()),
            Write::Partner {
                id: transaction.partner_id.clone(),
                patch,
            },
        ];
        if !delta.is_zero() {
            writes.extend(share_writes(&roster).1);
        }
        self.apply_writes("record_transaction", writes).await?;

        info!(
            partner_id = %transaction.partner_id,
            kind = ?kind,
            %amount,
            "Transaction recorded"
        );
        Ok(transaction)
    }

    /// Totals and per-partner figures.
    pub async fn financial_summary(&self) -> LedgerResult<FinancialSummary> {
        let partners = self.store.list_partners(true).await?;
        Ok(summarize(&partners))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) async fn load_all(&self) -> LedgerResult<LedgerData> {
        Ok(LedgerData {
            partners: self.store.list_partners(true).await?,
            sales: self.store.list_sales().await?,
            installments: self.store.list_installments().await?,
            transactions: self.store.list_transactions().await?,
        })
    }

    /// Runs the writes of one operation in order, stopping at the first
    /// failure.
    ///
    /// Every read happens before this is called. A failure on the first
    /// write has changed nothing and surfaces as a plain store error; any
    /// later failure is a partial application.
    async fn apply_writes(&self, operation: &'static str, writes: Vec<Write>) -> LedgerResult<usize> {
        let total = writes.len();

        for (applied, write) in writes.iter().enumerate() {
            let result = match write {
                Write::InsertSale { sale, installments } => {
                    self.store.insert_sale(sale, installments).await
                }
                Write::InsertPartner(partner) => self.store.insert_partner(partner).await,
                Write::InsertTransaction(transaction) => {
                    self.store.insert_transaction(transaction).await
                }
                Write::Partner { id, patch } => self.store.update_partner(id, patch).await,
                Write::Installment { id, patch } => self.store.update_installment(id, patch).await,
                Write::Sale { id, patch } => self.store.update_sale(id, patch).await,
            };

            if let Err(source) = result {
                if applied == 0 {
                    return Err(source.into());
                }
                error!(
                    operation,
                    applied,
                    total,
                    write = write.kind(),
                    target = write.target(),
                    error = %source,
                    "Partial application, reconciliation required"
                );
                return Err(LedgerError::PartialApplication {
                    operation,
                    applied,
                    total,
                    failed_at: write.target().to_string(),
                    source,
                });
            }
            debug!(operation, write = write.kind(), target = write.target(), "Write applied");
        }

        Ok(total)
    }
}

// =============================================================================
// Writes
// =============================================================================

/// One store mutation within a ledger operation.
#[derive(Debug)]
enum Write {
    InsertSale {
        sale: Sale,
        installments: Vec<Installment>,
    },
    InsertPartner(Partner),
    InsertTransaction(CapitalTransaction),
    Partner { id: String, patch: PartnerPatch },
    Installment { id: String, patch: InstallmentPatch },
    Sale { id: String, patch: SalePatch },
}

impl Write {
    fn kind(&self) -> &'static str {
        match self {
            Write::InsertSale { .. } => "insert_sale",
            Write::InsertPartner(_) => "insert_partner",
            Write::InsertTransaction(_) => "insert_transaction",
            Write::Partner { .. } => "update_partner",
            Write::Installment { .. } => "update_installment",
            Write::Sale { .. } => "update_sale",
        }
    }

    /// Id of the record being written.
    fn target(&self) -> &str {
        match self {
            Write::InsertSale { sale, .. } => &sale.id,
            Write::InsertPartner(partner) => &partner.id,
            Write::InsertTransaction(transaction) => &transaction.id,
            Write::Partner { id, .. } | Write::Installment { id, .. } | Write::Sale { id, .. } => id,
        }
    }
}

fn purchase_writes(partners: &[Partner], portions: &[Portion]) -> Vec<Write> {
    portions
        .iter()
        .filter(|portion| !portion.portion.is_zero())
        .filter_map(|portion| {
            let partner = partners.iter().find(|p| p.id == portion.id)?;
            let after = partner.available_capital - portion.portion;
            if after.is_negative() {
                warn!(
                    partner_id = %partner.id,
                    available = %partner.available_capital,
                    deduction = %portion.portion,
                    "Deduction exceeds partner's available capital, flooring at zero"
                );
            }
            Some(Write::Partner {
                id: partner.id.clone(),
                patch: PartnerPatch {
                    available_capital: Some(after.floor_zero()),
                    ..PartnerPatch::default()
                },
            })
        })
        .collect()
}

fn initial_profit_writes(partners: &[Partner], portions: &[Portion]) -> Vec<Write> {
    portions
        .iter()
        .filter(|portion| !portion.portion.is_zero())
        .filter_map(|portion| {
            let partner = partners.iter().find(|p| p.id == portion.id)?;
            Some(Write::Partner {
                id: partner.id.clone(),
                patch: PartnerPatch {
                    initial_profit: Some(partner.initial_profit + portion.portion),
                    ..PartnerPatch::default()
                },
            })
        })
        .collect()
}

fn split_payment(
    principal: Money,
    interest: Money,
    due_date: NaiveDate,
    weights: &[Weight],
) -> PaymentAllocation {
    if weights.is_empty() {
        warn!(%due_date, %principal, %interest, "No partner active on due date, payment not attributed");
        return PaymentAllocation::default();
    }
    PaymentAllocation {
        principal: allocate(principal, weights),
        interest: allocate(interest, weights),
    }
}

fn payment_writes(partners: &[Partner], allocation: &PaymentAllocation) -> Vec<Write> {
    allocation
        .principal
        .iter()
        .zip(&allocation.interest)
        .filter_map(|(returned, earned)| {
            let partner = partners.iter().find(|p| p.id == returned.id)?;
            let uncapped = partner.available_capital + returned.portion;
            if uncapped > partner.capital {
                warn!(
                    partner_id = %partner.id,
                    capital = %partner.capital,
                    uncapped = %uncapped,
                    "Returned principal exceeds capital, capping"
                );
            }
            Some(Write::Partner {
                id: partner.id.clone(),
                patch: PartnerPatch {
                    available_capital: Some(uncapped.min(partner.capital).floor_zero()),
                    monthly_profit: Some(partner.monthly_profit + earned.portion),
                    ..PartnerPatch::default()
                },
            })
        })
        .collect()
}

/// Current shares of `roster`, and writes for those stored shares that no
/// longer match.
fn share_writes(roster: &[Partner]) -> (HashMap<String, f64>, Vec<Write>) {
    let roster_capital = roster_capital(roster);

    let shares: HashMap<String, f64> = roster
        .iter()
        .map(|p| (p.id.clone(), expected_share(p, roster_capital)))
        .collect();

    let writes = roster
        .iter()
        .filter(|p| (p.share_percent - shares[&p.id]).abs() > f64::EPSILON)
        .map(|p| Write::Partner {
            id: p.id.clone(),
            patch: PartnerPatch {
                share_percent: Some(shares[&p.id]),
                ..PartnerPatch::default()
            },
        })
        .collect();

    (shares, writes)
}

/// Active sales whose installments are all paid.
fn settled_sales(data: &LedgerData) -> Vec<String> {
    data.sales
        .iter()
        .filter(|s| s.status == SaleStatus::Active)
        .filter(|s| {
            let mut schedule = data.installments.iter().filter(|i| i.sale_id == s.id).peekable();
            schedule.peek().is_some() && schedule.all(|i| i.is_paid())
        })
        .map(|s| s.id.clone())
        .collect()
}

fn find_partner<'a>(roster: &'a mut [Partner], partner_id: &str) -> LedgerResult<&'a mut Partner> {
    roster
        .iter_mut()
        .find(|p| p.id == partner_id)
        .ok_or_else(|| LedgerError::NotFound {
            entity: "partner",
            id: partner_id.to_string(),
        })
}

// =============================================================================
// Pure Helpers
// =============================================================================

fn availability_of(partners: &[Partner], price: Money, as_of: NaiveDate) -> Availability {
    let active: Vec<&Partner> = partners.iter().filter(|p| p.is_active_at(as_of)).collect();
    let available: Money = active.iter().map(|p| p.available_capital).sum();
    let shortfall = (price - available).floor_zero();

    Availability {
        requested: price,
        available,
        shortfall,
        is_available: shortfall.is_zero(),
        as_of,
        partners: active.len(),
    }
}

fn insufficient_capital(availability: &Availability) -> LedgerError {
    warn!(
        requested = %availability.requested,
        available = %availability.available,
        shortfall = %availability.shortfall,
        as_of = %availability.as_of,
        "Insufficient capital"
    );
    LedgerError::InsufficientCapital {
        requested: availability.requested,
        available: availability.available,
        shortfall: availability.shortfall,
        as_of: availability.as_of,
        partners: availability.partners,
    }
}

/// Σ capital of partners who have not left.
pub(crate) fn roster_capital(partners: &[Partner]) -> Money {
    partners
        .iter()
        .filter(|p| p.leave_date.is_none())
        .map(|p| p.capital)
        .sum()
}

/// Share of current capital, in percent. Retired partners hold none.
pub(crate) fn expected_share(partner: &Partner, roster_capital: Money) -> f64 {
    if partner.leave_date.is_some() || !roster_capital.is_positive() {
        return 0.0;
    }
    partner.capital.units() as f64 / roster_capital.units() as f64 * 100.0
}

pub(crate) fn summarize(partners: &[Partner]) -> FinancialSummary {
    let lines: Vec<PartnerSummary> = partners
        .iter()
        .map(|p| PartnerSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            active: p.leave_date.is_none(),
            capital: p.capital,
            available_capital: p.available_capital,
            used_capital: p.used_capital(),
            share_percent: p.share_percent,
            initial_profit: p.initial_profit,
            monthly_profit: p.monthly_profit,
            total_profit: p.total_profit(),
        })
        .collect();

    let total_capital: Money = lines.iter().map(|l| l.capital).sum();
    let total_available: Money = lines.iter().map(|l| l.available_capital).sum();
    let total_initial_profit: Money = lines.iter().map(|l| l.initial_profit).sum();
    let total_monthly_profit: Money = lines.iter().map(|l| l.monthly_profit).sum();

    FinancialSummary {
        total_capital,
        total_available,
        total_used: total_capital - total_available,
        total_initial_profit,
        total_monthly_profit,
        total_profit: total_initial_profit + total_monthly_profit,
        partners: lines,
    }
}

/// Balances of one partner as the event history says they should be.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DerivedBalances {
    pub id: String,
    pub available_capital: Money,
    pub initial_profit: Money,
    pub monthly_profit: Money,
    pub share_percent: f64,
}

#[derive(Debug, Default)]
struct Flows {
    deducted: Money,
    returned: Money,
    initial: Money,
    monthly: Money,
}

/// Replays every sale, paid installment and profit outflow from zero.
pub(crate) fn derive_balances(data: &LedgerData) -> Vec<DerivedBalances> {
    let history = data.history();
    let mut flows: HashMap<&str, Flows> = data
        .partners
        .iter()
        .map(|p| (p.id.as_str(), Flows::default()))
        .collect();

    let mut credit = |portions: Vec<Portion>, apply: fn(&mut Flows, Money)| {
        for portion in portions {
            if let Some(f) = flows.get_mut(portion.id.as_str()) {
                apply(f, portion.portion);
            }
        }
    };

    for sale in &data.sales {
        let weights = history.weights_at(sale.sale_date);
        credit(allocate(sale.purchase_price, &weights), |f, m| f.deducted += m);
        credit(allocate(sale.initial_profit, &weights), |f, m| f.initial += m);
    }

    for installment in data.installments.iter().filter(|i| i.is_paid()) {
        let weights = history.weights_at(installment.due_date);
        credit(allocate(installment.principal_amount, &weights), |f, m| f.returned += m);
        credit(allocate(installment.interest_amount, &weights), |f, m| f.monthly += m);
    }

    for tx in &data.transactions {
        if let Some(f) = flows.get_mut(tx.partner_id.as_str()) {
            f.initial -= tx.kind.initial_profit_outflow(tx.amount);
            f.monthly -= tx.kind.monthly_profit_outflow(tx.amount);
        }
    }

    let roster_capital = roster_capital(&data.partners);

    data.partners
        .iter()
        .map(|p| {
            let f = flows.get(p.id.as_str());
            let deducted = f.map(|f| f.deducted).unwrap_or_default();
            let returned = f.map(|f| f.returned).unwrap_or_default();

            DerivedBalances {
                id: p.id.clone(),
                available_capital: (p.capital - deducted + returned)
                    .min(p.capital)
                    .floor_zero(),
                initial_profit: f.map(|f| f.initial).unwrap_or_default(),
                monthly_profit: f.map(|f| f.monthly).unwrap_or_default(),
                share_percent: expected_share(p, roster_capital),
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use installo_core::{InterestPolicy, Rate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn m(units: i64) -> Money {
        Money::from_units(units)
    }

    fn partner(id: &str, capital: i64, join: NaiveDate, leave: Option<NaiveDate>) -> Partner {
        Partner {
            id: id.to_string(),
            name: id.to_uppercase(),
            capital: m(capital),
            available_capital: m(capital),
            initial_profit: Money::zero(),
            monthly_profit: Money::zero(),
            share_percent: 0.0,
            join_date: join,
            leave_date: leave,
            created_at: Utc::now(),
        }
    }

    fn draft(purchase: i64, announced: i64, down: i64, term: u32, sale_date: NaiveDate) -> SaleDraft {
        SaleDraft {
            customer_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            phone_id: "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_string(),
            purchase_price: m(purchase),
            announced_price: m(announced),
            down_payment: m(down),
            term_months: term,
            interest_policy: InterestPolicy::DecliningBalance,
            custom_rate: None,
            sale_date,
        }
    }

    fn ledger_over(partners: Vec<Partner>) -> (CapitalLedger, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_partners(partners));
        let ledger = CapitalLedger::new(store.clone(), EngineConfig::default());
        (ledger, store)
    }

    async fn get(store: &MemoryStore, id: &str) -> Partner {
        store
            .list_partners(true)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.id == id)
            .unwrap()
    }

    #[tokio::test]
    async fn test_insufficient_capital_mutates_nothing() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 10_000_000, start, None),
            partner("b", 5_000_000, start, None),
        ]);
        let before = store.list_partners(true).await.unwrap();

        let availability = ledger
            .check_availability(m(20_000_000), Some(date(2024, 2, 1)))
            .await
            .unwrap();
        assert!(!availability.is_available);
        assert_eq!(availability.available, m(15_000_000));
        assert_eq!(availability.shortfall, m(5_000_000));

        let err = ledger
            .apply_purchase(m(20_000_000), date(2024, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCapital { shortfall, .. } if shortfall == m(5_000_000)
        ));
        assert_eq!(store.list_partners(true).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_purchase_split_by_capital() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 60_000_000, start, None),
            partner("b", 40_000_000, start, None),
        ]);

        let portions = ledger
            .apply_purchase(m(20_000_000), date(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(installo_core::allocation::total(&portions), m(20_000_000));

        assert_eq!(get(&store, "a").await.available_capital, m(48_000_000));
        assert_eq!(get(&store, "b").await.available_capital, m(32_000_000));
    }

    #[tokio::test]
    async fn test_payment_caps_available_at_capital() {
        let mut a = partner("a", 10_000_000, date(2024, 1, 1), None);
        a.available_capital = m(9_900_000);
        let (ledger, store) = ledger_over(vec![a]);

        ledger
            .apply_installment_payment(m(500_000), m(40_000), date(2024, 3, 1))
            .await
            .unwrap();

        let a = get(&store, "a").await;
        assert_eq!(a.available_capital, m(10_000_000));
        assert_eq!(a.monthly_profit, m(40_000));
    }

    #[tokio::test]
    async fn test_historical_attribution_survives_recompute() {
        let (ledger, store) = ledger_over(vec![
            partner("a", 60_000_000, date(2024, 1, 1), None),
            partner("b", 40_000_000, date(2024, 1, 1), Some(date(2024, 3, 1))),
            partner("c", 50_000_000, date(2024, 3, 1), None),
        ]);

        // a and b fund the first sale, c has not joined yet
        ledger
            .register_sale(draft(10_000_000, 12_000_000, 2_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap();
        // b has left, a and c fund the second
        ledger
            .register_sale(draft(5_000_000, 6_000_000, 0, 2, date(2024, 4, 1)))
            .await
            .unwrap();

        ledger.recompute_all().await.unwrap();

        let a = get(&store, "a").await;
        let b = get(&store, "b").await;
        let c = get(&store, "c").await;

        assert_eq!(b.initial_profit, m(800_000));
        assert_eq!(b.available_capital, m(36_000_000));

        // 1,000,000 × 50/110 with the remainder
        assert_eq!(c.initial_profit, m(454_546));
        assert_eq!(c.available_capital, m(47_727_272));

        assert_eq!(a.initial_profit, m(1_200_000 + 545_454));
        assert_eq!(a.available_capital, m(60_000_000 - 6_000_000 - 2_727_272));

        assert_eq!(b.share_percent, 0.0);
        assert!((a.share_percent - 60_000_000.0 / 110_000_000.0 * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let (ledger, store) = ledger_over(vec![
            partner("a", 30_000_000, date(2024, 1, 1), None),
            partner("b", 20_000_000, date(2024, 1, 1), None),
        ]);
        let planned = ledger
            .register_sale(draft(9_000_000, 10_000_000, 1_000_000, 3, date(2024, 1, 10)))
            .await
            .unwrap();
        ledger
            .pay_installment(&planned.installments[0].id, date(2024, 2, 10))
            .await
            .unwrap();

        let first = ledger.recompute_all().await.unwrap();
        let after_first = store.list_partners(true).await.unwrap();
        let second = ledger.recompute_all().await.unwrap();
        let after_second = store.list_partners(true).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(after_first, after_second);
    }

    fn partial_at(err: &LedgerError) -> (&'static str, usize, usize, &str) {
        match err {
            LedgerError::PartialApplication {
                operation,
                applied,
                total,
                failed_at,
                ..
            } => (*operation, *applied, *total, failed_at.as_str()),
            other => panic!("expected partial application, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_partial_application_is_reported_and_repairable() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 10_000_000, start, None),
            partner("b", 10_000_000, start, None),
            partner("c", 10_000_000, start, None),
        ]);

        // sale row, three purchase writes and one initial-profit write succeed
        store.fail_partner_updates_after(4).await;
        let err = ledger
            .register_sale(draft(3_000_000, 3_300_000, 300_000, 3, date(2024, 2, 1)))
            .await
            .unwrap_err();

        assert_eq!(partial_at(&err), ("register_sale", 5, 7, "b"));
        assert!(err.needs_reconciliation());

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();

        for id in ["a", "b", "c"] {
            let p = get(&store, id).await;
            assert_eq!(p.initial_profit, m(100_000));
            assert_eq!(p.available_capital, m(9_000_000));
        }
    }

    #[tokio::test]
    async fn test_stored_sale_with_no_partner_written_needs_reconciliation() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 10_000_000, start, None),
            partner("b", 10_000_000, start, None),
        ]);

        store.fail_partner_updates_after(0).await;
        let err = ledger
            .register_sale(draft(4_000_000, 5_000_000, 1_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap_err();

        // the sale is stored, no partner has been charged yet
        assert_eq!(partial_at(&err), ("register_sale", 1, 5, "a"));
        assert!(err.needs_reconciliation());
        assert_eq!(store.list_sales().await.unwrap().len(), 1);
        assert_eq!(get(&store, "a").await.available_capital, m(10_000_000));

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();

        for id in ["a", "b"] {
            let p = get(&store, id).await;
            assert_eq!(p.available_capital, m(8_000_000));
            assert_eq!(p.initial_profit, m(500_000));
        }
    }

    #[tokio::test]
    async fn test_paid_installment_with_no_credit_is_settled_by_recompute() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 10_000_000, start, None),
            partner("b", 10_000_000, start, None),
        ]);
        let planned = ledger
            .register_sale(draft(4_000_000, 5_000_000, 1_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap();
        let first = &planned.installments[0];

        store.fail_partner_updates_after(0).await;
        let err = ledger
            .pay_installment(&first.id, first.due_date)
            .await
            .unwrap_err();

        assert_eq!(partial_at(&err), ("pay_installment", 1, 3, "a"));
        assert!(err.needs_reconciliation());

        store.clear_failures().await;
        let retry = ledger.pay_installment(&first.id, first.due_date).await;
        assert!(matches!(retry, Err(LedgerError::AlreadyPaid { .. })));
        assert_eq!(get(&store, "a").await.monthly_profit, Money::zero());

        ledger.recompute_all().await.unwrap();

        let a = get(&store, "a").await;
        let b = get(&store, "b").await;
        assert!(a.monthly_profit.is_positive());
        assert_eq!(a.monthly_profit + b.monthly_profit, first.interest_amount);
        assert_eq!(
            a.available_capital + b.available_capital,
            m(16_000_000) + first.principal_amount
        );
    }

    #[tokio::test]
    async fn test_interrupted_final_payment_completes_on_recompute() {
        let start = date(2024, 1, 1);
        let (ledger, store) = ledger_over(vec![
            partner("a", 10_000_000, start, None),
            partner("b", 10_000_000, start, None),
        ]);
        let planned = ledger
            .register_sale(draft(4_000_000, 5_000_000, 1_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap();
        let (first, last) = (&planned.installments[0], &planned.installments[1]);
        ledger.pay_installment(&first.id, first.due_date).await.unwrap();

        // installment and a's credit go through, b's credit and the sale do not
        store.fail_partner_updates_after(1).await;
        let err = ledger
            .pay_installment(&last.id, last.due_date)
            .await
            .unwrap_err();

        assert_eq!(partial_at(&err), ("pay_installment", 2, 4, "b"));
        assert_eq!(store.list_sales().await.unwrap()[0].status, SaleStatus::Active);

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();

        assert_eq!(store.list_sales().await.unwrap()[0].status, SaleStatus::Completed);
        for id in ["a", "b"] {
            assert_eq!(get(&store, id).await.available_capital, m(10_000_000));
        }
        let interest = first.interest_amount + last.interest_amount;
        assert_eq!(
            get(&store, "a").await.monthly_profit + get(&store, "b").await.monthly_profit,
            interest
        );
    }

    #[tokio::test]
    async fn test_logged_withdrawal_with_no_partner_write_needs_reconciliation() {
        let (ledger, store) = ledger_over(vec![partner("a", 10_000_000, date(2024, 1, 1), None)]);
        let planned = ledger
            .register_sale(draft(4_000_000, 5_000_000, 1_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap();
        let first = &planned.installments[0];
        ledger.pay_installment(&first.id, first.due_date).await.unwrap();
        assert_eq!(get(&store, "a").await.monthly_profit, first.interest_amount);

        store.fail_partner_updates_after(0).await;
        let err = ledger
            .record_transaction(
                "a",
                TransactionKind::MonthlyProfitWithdraw,
                first.interest_amount,
                first.due_date,
                "payout",
            )
            .await
            .unwrap_err();

        assert_eq!(partial_at(&err), ("record_transaction", 1, 2, "a"));
        assert!(err.needs_reconciliation());
        assert_eq!(store.list_transactions().await.unwrap().len(), 1);
        assert_eq!(get(&store, "a").await.monthly_profit, first.interest_amount);

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();
        assert_eq!(get(&store, "a").await.monthly_profit, Money::zero());
    }

    #[tokio::test]
    async fn test_capital_add_stopped_before_shares_needs_reconciliation() {
        let start = date(2024, 1, 1);
        let mut a = partner("a", 10_000_000, start, None);
        let mut b = partner("b", 10_000_000, start, None);
        a.share_percent = 50.0;
        b.share_percent = 50.0;
        let (ledger, store) = ledger_over(vec![a, b]);

        // log entry, a's balances and a's share go through, b's share does not
        store.fail_partner_updates_after(2).await;
        let err = ledger
            .record_transaction("a", TransactionKind::CapitalAdd, m(10_000_000), date(2024, 2, 1), "")
            .await
            .unwrap_err();

        assert_eq!(partial_at(&err), ("record_transaction", 3, 4, "b"));
        assert!(err.needs_reconciliation());
        assert_eq!(get(&store, "b").await.share_percent, 50.0);

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();

        let a = get(&store, "a").await;
        let b = get(&store, "b").await;
        assert_eq!(a.capital, m(20_000_000));
        assert!((a.share_percent - 200.0 / 3.0).abs() < 1e-9);
        assert!((b.share_percent - 100.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_admitted_partner_with_stale_shares_needs_reconciliation() {
        let mut a = partner("a", 30_000_000, date(2024, 1, 1), None);
        a.share_percent = 100.0;
        let (ledger, store) = ledger_over(vec![a]);

        store.fail_partner_updates_after(0).await;
        let err = ledger
            .admit_partner("Sara", m(10_000_000), date(2024, 2, 1))
            .await
            .unwrap_err();

        // the new partner is stored, a still holds the whole share
        assert_eq!(partial_at(&err), ("admit_partner", 1, 3, "a"));
        assert_eq!(store.list_partners(true).await.unwrap().len(), 2);

        store.clear_failures().await;
        ledger.recompute_all().await.unwrap();
        assert_eq!(get(&store, "a").await.share_percent, 75.0);
    }

    #[tokio::test]
    async fn test_first_write_failure_is_a_plain_store_error() {
        let (ledger, store) = ledger_over(vec![partner("a", 10_000_000, date(2024, 1, 1), None)]);

        store.fail_partner_updates_after(0).await;
        let err = ledger
            .apply_purchase(m(1_000_000), date(2024, 2, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert!(!err.needs_reconciliation());
        assert_eq!(get(&store, "a").await.available_capital, m(10_000_000));
    }

    #[tokio::test]
    async fn test_paying_every_installment_completes_sale() {
        let (ledger, store) = ledger_over(vec![partner("a", 100_000_000, date(2024, 1, 1), None)]);
        let planned = ledger
            .register_sale(draft(10_000_000, 12_000_000, 2_000_000, 2, date(2024, 1, 15)))
            .await
            .unwrap();

        for installment in &planned.installments {
            ledger
                .pay_installment(&installment.id, installment.due_date)
                .await
                .unwrap();
        }

        let a = get(&store, "a").await;
        assert_eq!(a.initial_profit, m(2_000_000));
        assert_eq!(a.monthly_profit, m(400_000 + 200_000));
        assert_eq!(a.available_capital, m(100_000_000));

        let sales = store.list_sales().await.unwrap();
        assert_eq!(sales[0].status, SaleStatus::Completed);

        let err = ledger
            .pay_installment(&planned.installments[0].id, date(2024, 5, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyPaid { .. }));
    }

    #[tokio::test]
    async fn test_rejected_sale_writes_nothing() {
        let (ledger, store) = ledger_over(vec![partner("a", 100_000_000, date(2024, 1, 1), None)]);
        let mut d = draft(10_000_000, 12_000_000, 2_000_000, 6, date(2024, 1, 15));
        d.interest_policy = InterestPolicy::CustomLumpSum;
        d.custom_rate = Some(Rate::from_bps(700));

        let err = ledger.register_sale(d).await.unwrap_err();
        assert!(err.is_rejection());
        assert!(store.list_sales().await.unwrap().is_empty());
        assert_eq!(get(&store, "a").await.available_capital, m(100_000_000));
    }

    #[tokio::test]
    async fn test_mark_overdue() {
        let (ledger, store) = ledger_over(vec![partner("a", 100_000_000, date(2024, 1, 1), None)]);
        ledger
            .register_sale(draft(10_000_000, 12_000_000, 2_000_000, 3, date(2024, 1, 15)))
            .await
            .unwrap();

        // due 02-15 and 03-15 are past, 04-15 is not
        let marked = ledger.mark_overdue(date(2024, 4, 1)).await.unwrap();
        assert_eq!(marked, 2);

        let overdue = store
            .list_installments()
            .await
            .unwrap()
            .iter()
            .filter(|i| i.status == InstallmentStatus::Overdue)
            .count();
        assert_eq!(overdue, 2);
    }

    #[tokio::test]
    async fn test_transactions() {
        let (ledger, store) = ledger_over(vec![partner("a", 10_000_000, date(2024, 1, 1), None)]);
        let day = date(2024, 2, 1);

        let err = ledger
            .record_transaction("a", TransactionKind::CapitalWithdraw, m(11_000_000), day, "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance { balance: "available_capital", .. }
        ));

        ledger
            .record_transaction("a", TransactionKind::CapitalAdd, m(2_000_000), day, "top-up")
            .await
            .unwrap();
        let a = get(&store, "a").await;
        assert_eq!(a.capital, m(12_000_000));
        assert_eq!(a.available_capital, m(12_000_000));

        ledger.apply_initial_profit(m(500_000), day).await.unwrap();
        ledger
            .record_transaction("a", TransactionKind::InitialProfitToCapital, m(200_000), day, "")
            .await
            .unwrap();
        let a = get(&store, "a").await;
        assert_eq!(a.initial_profit, m(300_000));
        assert_eq!(a.capital, m(12_200_000));
        assert_eq!(a.share_percent, 100.0);

        let err = ledger
            .record_transaction("a", TransactionKind::MonthlyProfitWithdraw, m(1), day, "")
            .await
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(store.list_transactions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_admit_and_retire_partner() {
        let (ledger, store) = ledger_over(vec![partner("a", 30_000_000, date(2024, 1, 1), None)]);

        let b = ledger
            .admit_partner("  Sara ", m(10_000_000), date(2024, 2, 1))
            .await
            .unwrap();
        assert_eq!(b.name, "Sara");
        assert_eq!(b.share_percent, 25.0);
        assert_eq!(get(&store, "a").await.share_percent, 75.0);

        ledger.retire_partner(&b.id, date(2024, 6, 1)).await.unwrap();
        assert_eq!(get(&store, "a").await.share_percent, 100.0);
        assert_eq!(store.list_partners(false).await.unwrap().len(), 1);

        assert!(ledger.retire_partner(&b.id, date(2024, 7, 1)).await.is_err());
        assert!(matches!(
            ledger.retire_partner("ghost", date(2024, 7, 1)).await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_financial_summary() {
        let (ledger, _store) = ledger_over(vec![
            partner("a", 60_000_000, date(2024, 1, 1), None),
            partner("b", 40_000_000, date(2024, 1, 1), None),
        ]);
        ledger
            .register_sale(draft(10_000_000, 12_000_000, 2_000_000, 2, date(2024, 2, 1)))
            .await
            .unwrap();

        let summary = ledger.financial_summary().await.unwrap();
        assert_eq!(summary.total_capital, m(100_000_000));
        assert_eq!(summary.total_used, m(10_000_000));
        assert_eq!(summary.total_initial_profit, m(2_000_000));
        assert_eq!(summary.partners.len(), 2);
    }
}
