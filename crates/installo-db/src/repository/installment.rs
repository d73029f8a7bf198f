//! # Installment Repository
//!
//! Installments are written with their sale (see
//! [`super::SaleRepository::insert_with_installments`]); afterwards only
//! `status` and `paid_date` change.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use installo_core::{Installment, InstallmentPatch, InstallmentStatus};

const INSTALLMENT_COLUMNS: &str = r#"
    id,
    sale_id,
    sequence,
    principal_amount,
    interest_amount,
    total_amount,
    remaining_debt_after,
    due_date,
    paid_date,
    status
"#;

#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    pool: SqlitePool,
}

impl InstallmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InstallmentRepository { pool }
    }

    /// Every installment, by due date then sequence.
    pub async fn list(&self) -> DbResult<Vec<Installment>> {
        let sql = format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments ORDER BY due_date, sequence, rowid"
        );

        let installments = sqlx::query_as::<_, Installment>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(installments)
    }

    /// One sale's schedule, in sequence order.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<Installment>> {
        let sql = format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE sale_id = ?1 ORDER BY sequence"
        );

        let installments = sqlx::query_as::<_, Installment>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(installments)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Installment>> {
        let sql = format!("SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE id = ?1");

        let installment = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(installment)
    }

    /// Writes `status` and/or `paid_date`.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Installment doesn't exist
    pub async fn update(&self, id: &str, patch: &InstallmentPatch) -> DbResult<()> {
        debug!(id = %id, ?patch, "Updating installment");

        let result = sqlx::query(
            r#"
            UPDATE installments SET
                status    = COALESCE(?2, status),
                paid_date = COALESCE(?3, paid_date)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.status)
        .bind(patch.paid_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Installment", id));
        }

        Ok(())
    }

    pub async fn count_by_status(&self, status: InstallmentStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM installments WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{date, planned_sale, test_db};
    use installo_core::{InstallmentPatch, InstallmentStatus, InterestPolicy};

    #[tokio::test]
    async fn test_list_orders_by_due_date_across_sales() {
        let db = test_db().await;
        let later = planned_sale(2_000_000, 2, InterestPolicy::DecliningBalance, date(2024, 3, 10));
        let earlier = planned_sale(2_000_000, 2, InterestPolicy::DecliningBalance, date(2024, 1, 10));
        for planned in [&later, &earlier] {
            db.sales()
                .insert_with_installments(&planned.sale, &planned.installments)
                .await
                .unwrap();
        }

        let due: Vec<_> = db
            .installments()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.due_date)
            .collect();
        assert_eq!(
            due,
            vec![date(2024, 2, 10), date(2024, 3, 10), date(2024, 4, 10), date(2024, 5, 10)]
        );
    }

    #[tokio::test]
    async fn test_mark_paid() {
        let db = test_db().await;
        let planned = planned_sale(2_000_000, 2, InterestPolicy::DecliningBalance, date(2024, 1, 1));
        db.sales()
            .insert_with_installments(&planned.sale, &planned.installments)
            .await
            .unwrap();

        let first = &planned.installments[0];
        let patch = InstallmentPatch {
            status: Some(InstallmentStatus::Paid),
            paid_date: Some(date(2024, 2, 3)),
        };
        db.installments().update(&first.id, &patch).await.unwrap();

        let loaded = db.installments().get_by_id(&first.id).await.unwrap().unwrap();
        assert!(loaded.is_paid());
        assert_eq!(loaded.paid_date, Some(date(2024, 2, 3)));
        assert_eq!(
            db.installments()
                .count_by_status(InstallmentStatus::Pending)
                .await
                .unwrap(),
            1
        );

        // a status-only patch keeps the recorded paid date
        let overdue = InstallmentPatch {
            status: Some(InstallmentStatus::Overdue),
            paid_date: None,
        };
        db.installments().update(&first.id, &overdue).await.unwrap();
        let loaded = db.installments().get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(loaded.paid_date, Some(date(2024, 2, 3)));
    }
}
