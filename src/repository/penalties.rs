//! Penalties repository for database operations

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PageRequest,
        penalty::{CreatePenalty, Penalty, UpdatePenalty},
    },
};

#[derive(Clone)]
pub struct PenaltiesRepository {
    pool: Pool<Postgres>,
}

impl PenaltiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Penalty> {
        sqlx::query_as::<_, Penalty>("SELECT * FROM penalties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Penalty with id {} not found", id)))
    }

    /// List penalties; `active` is evaluated against `today`
    pub async fn list(
        &self,
        user_id: Option<i32>,
        active: Option<bool>,
        today: NaiveDate,
        window: PageRequest,
    ) -> AppResult<(Vec<Penalty>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM penalties
            WHERE ($1::int IS NULL OR user_id = $1)
              AND ($2::bool IS NULL OR (ends_on IS NULL OR ends_on > $3) = $2)
            "#,
        )
        .bind(user_id)
        .bind(active)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let penalties = sqlx::query_as::<_, Penalty>(
            r#"
            SELECT * FROM penalties
            WHERE ($1::int IS NULL OR user_id = $1)
              AND ($2::bool IS NULL OR (ends_on IS NULL OR ends_on > $3) = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(user_id)
        .bind(active)
        .bind(today)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((penalties, total))
    }

    /// Every penalty of a user, newest first
    pub async fn for_user(&self, user_id: i32) -> AppResult<Vec<Penalty>> {
        let penalties = sqlx::query_as::<_, Penalty>(
            "SELECT * FROM penalties WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(penalties)
    }

    pub async fn create(&self, penalty: &CreatePenalty) -> AppResult<Penalty> {
        sqlx::query_as::<_, Penalty>(
            r#"
            INSERT INTO penalties (description, ends_on, amount, user_id, loan_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&penalty.description)
        .bind(penalty.ends_on)
        .bind(penalty.amount)
        .bind(penalty.user_id)
        .bind(penalty.loan_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::NotFound("User or loan not found".to_string())
            }
            other => AppError::Database(other),
        })
    }

    pub async fn update(&self, id: i32, patch: UpdatePenalty) -> AppResult<Penalty> {
        let mut tx = self.pool.begin().await?;

        let mut penalty =
            sqlx::query_as::<_, Penalty>("SELECT * FROM penalties WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Penalty with id {} not found", id)))?;

        patch.apply(&mut penalty);

        let updated = sqlx::query_as::<_, Penalty>(
            r#"
            UPDATE penalties SET description = $2, ends_on = $3, amount = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&penalty.description)
        .bind(penalty.ends_on)
        .bind(penalty.amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM penalties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Penalty with id {} not found", id)));
        }
        Ok(())
    }
}
