//! # Partner Repository
//!
//! Roster storage. `capital` and `share_percent` are set by roster
//! operations; the three balance columns are rewritten by the ledger after
//! every sale, payment and recomputation.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use installo_core::{Partner, PartnerPatch};

const PARTNER_COLUMNS: &str = r#"
    id,
    name,
    capital,
    available_capital,
    initial_profit,
    monthly_profit,
    share_percent,
    join_date,
    leave_date,
    created_at
"#;

/// Repository for partner database operations.
#[derive(Debug, Clone)]
pub struct PartnerRepository {
    pool: SqlitePool,
}

impl PartnerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartnerRepository { pool }
    }

    /// Partners in the order they were added. Retired partners (those with
    /// a `leave_date`) only when `include_inactive` is set.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Partner>> {
        let sql = format!(
            "SELECT {PARTNER_COLUMNS} FROM partners \
             WHERE ?1 OR leave_date IS NULL \
             ORDER BY rowid"
        );

        let partners = sqlx::query_as::<_, Partner>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(partners)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Partner>> {
        let sql = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE id = ?1");

        let partner = sqlx::query_as::<_, Partner>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(partner)
    }

    /// Inserts a new partner.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - ID already exists
    pub async fn insert(&self, partner: &Partner) -> DbResult<()> {
        debug!(id = %partner.id, name = %partner.name, "Inserting partner");

        sqlx::query(
            r#"
            INSERT INTO partners (
                id, name, capital, available_capital,
                initial_profit, monthly_profit, share_percent,
                join_date, leave_date, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10
            )
            "#,
        )
        .bind(&partner.id)
        .bind(&partner.name)
        .bind(partner.capital)
        .bind(partner.available_capital)
        .bind(partner.initial_profit)
        .bind(partner.monthly_profit)
        .bind(partner.share_percent)
        .bind(partner.join_date)
        .bind(partner.leave_date)
        .bind(partner.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes the fields set in `patch`; unset fields keep their value.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Partner doesn't exist
    pub async fn update(&self, id: &str, patch: &PartnerPatch) -> DbResult<()> {
        debug!(id = %id, ?patch, "Updating partner");

        let result = sqlx::query(
            r#"
            UPDATE partners SET
                capital           = COALESCE(?2, capital),
                available_capital = COALESCE(?3, available_capital),
                initial_profit    = COALESCE(?4, initial_profit),
                monthly_profit    = COALESCE(?5, monthly_profit),
                share_percent     = COALESCE(?6, share_percent),
                leave_date        = COALESCE(?7, leave_date)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(patch.capital)
        .bind(patch.available_capital)
        .bind(patch.initial_profit)
        .bind(patch.monthly_profit)
        .bind(patch.share_percent)
        .bind(patch.leave_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Partner", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM partners")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{date, partner, test_db};
    use installo_core::{Money, PartnerPatch};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let p = partner("Reza", 60_000_000, date(2024, 1, 1));
        db.partners().insert(&p).await.unwrap();

        let loaded = db.partners().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Reza");
        assert_eq!(loaded.capital, Money::from_units(60_000_000));
        assert_eq!(loaded.join_date, date(2024, 1, 1));
        assert_eq!(loaded.leave_date, None);
        assert_eq!(db.partners().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_and_filters_retired() {
        let db = test_db().await;
        let a = partner("A", 10, date(2024, 3, 1));
        let mut b = partner("B", 10, date(2024, 1, 1));
        b.leave_date = Some(date(2024, 6, 1));
        let c = partner("C", 10, date(2024, 2, 1));
        for p in [&a, &b, &c] {
            db.partners().insert(p).await.unwrap();
        }

        let active: Vec<String> = db
            .partners()
            .list(false)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(active, vec!["A", "C"]);
        assert_eq!(db.partners().list(true).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_patch_only_touches_set_fields() {
        let db = test_db().await;
        let p = partner("Reza", 1_000, date(2024, 1, 1));
        db.partners().insert(&p).await.unwrap();

        let patch = PartnerPatch {
            available_capital: Some(Money::from_units(400)),
            monthly_profit: Some(Money::from_units(25)),
            ..PartnerPatch::default()
        };
        db.partners().update(&p.id, &patch).await.unwrap();

        let loaded = db.partners().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.capital, Money::from_units(1_000));
        assert_eq!(loaded.available_capital, Money::from_units(400));
        assert_eq!(loaded.monthly_profit, Money::from_units(25));
        assert_eq!(loaded.initial_profit, Money::zero());
    }

    #[tokio::test]
    async fn test_update_missing_partner() {
        let db = test_db().await;
        let err = db
            .partners()
            .update("ghost", &PartnerPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = test_db().await;
        let p = partner("Reza", 1_000, date(2024, 1, 1));
        db.partners().insert(&p).await.unwrap();

        let err = db.partners().insert(&p).await.unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }
}
