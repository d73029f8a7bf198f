//! # Capital Transaction Repository
//!
//! Append-only log of capital additions, withdrawals and profit
//! conversions. Rows are never updated.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use installo_core::CapitalTransaction;

const TRANSACTION_COLUMNS: &str = "id, partner_id, kind, amount, date, description";

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Full log, in date then insertion order.
    pub async fn list(&self) -> DbResult<Vec<CapitalTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM capital_transactions ORDER BY date, rowid"
        );

        let transactions = sqlx::query_as::<_, CapitalTransaction>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    pub async fn list_for_partner(&self, partner_id: &str) -> DbResult<Vec<CapitalTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM capital_transactions \
             WHERE partner_id = ?1 ORDER BY date, rowid"
        );

        let transactions = sqlx::query_as::<_, CapitalTransaction>(&sql)
            .bind(partner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Partner doesn't exist
    pub async fn insert(&self, transaction: &CapitalTransaction) -> DbResult<()> {
        debug!(
            id = %transaction.id,
            partner_id = %transaction.partner_id,
            kind = ?transaction.kind,
            "Recording capital transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO capital_transactions (id, partner_id, kind, amount, date, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.partner_id)
        .bind(transaction.kind)
        .bind(transaction.amount)
        .bind(transaction.date)
        .bind(&transaction.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
