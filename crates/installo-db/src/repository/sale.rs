//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. REGISTER                                                           │
//! │     └── insert_with_installments() → Sale { status: Active }           │
//! │         + every installment, in one transaction                        │
//! │                                                                         │
//! │  2. COLLECT                                                            │
//! │     └── installments().update(...) per payment                         │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── update_status(Completed)   all installments paid               │
//! │     └── update_status(Defaulted)   written off                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use installo_core::{Installment, Sale, SaleStatus};

const SALE_COLUMNS: &str = r#"
    id,
    customer_id,
    phone_id,
    purchase_price,
    announced_price,
    down_payment,
    term_months,
    interest_policy,
    custom_rate,
    initial_profit,
    sale_date,
    status
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// All sales, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date, rowid");

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Inserts a sale and its installment schedule.
    ///
    /// ## Atomicity
    /// Both go in one transaction: a failed installment insert leaves no
    /// sale behind.
    pub async fn insert_with_installments(
        &self,
        sale: &Sale,
        installments: &[Installment],
    ) -> DbResult<()> {
        debug!(
            id = %sale.id,
            installments = installments.len(),
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, phone_id,
                purchase_price, announced_price, down_payment,
                term_months, interest_policy, custom_rate,
                initial_profit, sale_date, status
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.phone_id)
        .bind(sale.purchase_price)
        .bind(sale.announced_price)
        .bind(sale.down_payment)
        .bind(sale.term_months)
        .bind(sale.interest_policy)
        .bind(sale.custom_rate)
        .bind(sale.initial_profit)
        .bind(sale.sale_date)
        .bind(sale.status)
        .execute(&mut *tx)
        .await?;

        for installment in installments {
            sqlx::query(
                r#"
                INSERT INTO installments (
                    id, sale_id, sequence,
                    principal_amount, interest_amount, total_amount,
                    remaining_debt_after, due_date, paid_date, status
                ) VALUES (
                    ?1, ?2, ?3,
                    ?4, ?5, ?6,
                    ?7, ?8, ?9, ?10
                )
                "#,
            )
            .bind(&installment.id)
            .bind(&installment.sale_id)
            .bind(installment.sequence)
            .bind(installment.principal_amount)
            .bind(installment.interest_amount)
            .bind(installment.total_amount)
            .bind(installment.remaining_debt_after)
            .bind(installment.due_date)
            .bind(installment.paid_date)
            .bind(installment.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Sets a sale's status.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Sale doesn't exist
    pub async fn update_status(&self, id: &str, status: SaleStatus) -> DbResult<()> {
        debug!(id = %id, ?status, "Updating sale status");

        let result = sqlx::query("UPDATE sales SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    pub async fn count_by_status(&self, status: SaleStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
