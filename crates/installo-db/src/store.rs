//! # LedgerStore over SQLite
//!
//! Lets [`CapitalLedger`](installo_ledger::CapitalLedger) and
//! [`FinancialReconciler`](installo_ledger::FinancialReconciler) run on a
//! [`Database`]. Each call maps onto one repository method; `insert_sale`
//! is the only one spanning several statements, and it runs in a single
//! transaction.

use async_trait::async_trait;

use installo_core::{
    CapitalTransaction, Installment, InstallmentPatch, Partner, PartnerPatch, Sale, SalePatch,
};
use installo_ledger::{LedgerStore, StoreResult};

use crate::pool::Database;

#[async_trait]
impl LedgerStore for Database {
    async fn list_partners(&self, include_inactive: bool) -> StoreResult<Vec<Partner>> {
        Ok(self.partners().list(include_inactive).await?)
    }

    async fn list_sales(&self) -> StoreResult<Vec<Sale>> {
        Ok(self.sales().list().await?)
    }

    async fn list_installments(&self) -> StoreResult<Vec<Installment>> {
        Ok(self.installments().list().await?)
    }

    async fn list_transactions(&self) -> StoreResult<Vec<CapitalTransaction>> {
        Ok(self.transactions().list().await?)
    }

    async fn update_partner(&self, id: &str, patch: &PartnerPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        Ok(self.partners().update(id, patch).await?)
    }

    async fn update_sale(&self, id: &str, patch: &SalePatch) -> StoreResult<()> {
        match patch.status {
            Some(status) => Ok(self.sales().update_status(id, status).await?),
            None => Ok(()),
        }
    }

    async fn update_installment(&self, id: &str, patch: &InstallmentPatch) -> StoreResult<()> {
        Ok(self.installments().update(id, patch).await?)
    }

    async fn insert_partner(&self, partner: &Partner) -> StoreResult<()> {
        Ok(self.partners().insert(partner).await?)
    }

    async fn insert_sale(&self, sale: &Sale, installments: &[Installment]) -> StoreResult<()> {
        Ok(self
            .sales()
            .insert_with_installments(sale, installments)
            .await?)
    }

    async fn insert_transaction(&self, transaction: &CapitalTransaction) -> StoreResult<()> {
        Ok(self.transactions().insert(transaction).await?)
    }
}
