//! In-memory [`LedgerStore`] backed by `tokio::sync::RwLock`.
//!
//! Used by the ledger and reconciler tests, and by callers that want to run
//! the engine over data they already hold. Partner updates can be made to
//! fail after a set number of successes, to exercise partial application.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use installo_core::{
    CapitalTransaction, Installment, InstallmentPatch, Partner, PartnerPatch, Sale, SalePatch,
};

use super::{LedgerStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    partners: Vec<Partner>,
    sales: Vec<Sale>,
    installments: Vec<Installment>,
    transactions: Vec<CapitalTransaction>,

    /// Partner updates still allowed before every further one fails.
    partner_update_budget: Option<usize>,
}

/// Vectors behind a lock; insertion order is roster order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with partners.
    pub fn with_partners(partners: Vec<Partner>) -> Self {
        MemoryStore {
            tables: RwLock::new(Tables {
                partners,
                ..Tables::default()
            }),
        }
    }

    /// Lets the next `successes` partner updates through, then fails the rest.
    pub async fn fail_partner_updates_after(&self, successes: usize) {
        self.tables.write().await.partner_update_budget = Some(successes);
    }

    /// Removes any failure set by [`Self::fail_partner_updates_after`].
    pub async fn clear_failures(&self) {
        self.tables.write().await.partner_update_budget = None;
    }

    /// Overwrites a partner wholesale, bypassing the ledger. Tests use this
    /// to plant drift.
    pub async fn put_partner(&self, partner: Partner) {
        let mut tables = self.tables.write().await;
        match tables.partners.iter_mut().find(|p| p.id == partner.id) {
            Some(existing) => *existing = partner,
            None => tables.partners.push(partner),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn list_partners(&self, include_inactive: bool) -> StoreResult<Vec<Partner>> {
        let tables = self.tables.read().await;
        Ok(tables
            .partners
            .iter()
            .filter(|p| include_inactive || p.leave_date.is_none())
            .cloned()
            .collect())
    }

    async fn list_sales(&self) -> StoreResult<Vec<Sale>> {
        Ok(self.tables.read().await.sales.clone())
    }

    async fn list_installments(&self) -> StoreResult<Vec<Installment>> {
        let tables = self.tables.read().await;
        let mut installments = tables.installments.clone();
        installments.sort_by(|a, b| (a.due_date, a.sequence).cmp(&(b.due_date, b.sequence)));
        Ok(installments)
    }

    async fn list_transactions(&self) -> StoreResult<Vec<CapitalTransaction>> {
        Ok(self.tables.read().await.transactions.clone())
    }

    async fn update_partner(&self, id: &str, patch: &PartnerPatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if let Some(budget) = tables.partner_update_budget.as_mut() {
            if *budget == 0 {
                return Err(StoreError::Backend(format!("injected failure updating {id}")));
            }
            *budget -= 1;
        }

        let partner = tables
            .partners
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "partner",
                id: id.to_string(),
            })?;
        patch.apply_to(partner);
        debug!(partner_id = %id, "Partner updated in memory");
        Ok(())
    }

    async fn update_sale(&self, id: &str, patch: &SalePatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let sale = tables
            .sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "sale",
                id: id.to_string(),
            })?;
        if let Some(status) = patch.status {
            sale.status = status;
        }
        Ok(())
    }

    async fn update_installment(&self, id: &str, patch: &InstallmentPatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let installment = tables
            .installments
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "installment",
                id: id.to_string(),
            })?;
        if let Some(status) = patch.status {
            installment.status = status;
        }
        if let Some(paid) = patch.paid_date {
            installment.paid_date = Some(paid);
        }
        Ok(())
    }

    async fn insert_partner(&self, partner: &Partner) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.partners.iter().any(|p| p.id == partner.id) {
            return Err(StoreError::Backend(format!("duplicate partner {}", partner.id)));
        }
        tables.partners.push(partner.clone());
        Ok(())
    }

    async fn insert_sale(&self, sale: &Sale, installments: &[Installment]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.sales.iter().any(|s| s.id == sale.id) {
            return Err(StoreError::Backend(format!("duplicate sale {}", sale.id)));
        }
        tables.sales.push(sale.clone());
        tables.installments.extend_from_slice(installments);
        Ok(())
    }

    async fn insert_transaction(&self, transaction: &CapitalTransaction) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .transactions
            .push(transaction.clone());
        Ok(())
    }
}
