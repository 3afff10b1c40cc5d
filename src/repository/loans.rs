//! Loans repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanDetails, LoanStatus, NewLoan, ReturnPlan},
        pagination::PageRequest,
        penalty::Penalty,
    },
};

const DETAILS_SELECT: &str = r#"
    SELECT l.*,
           u.name AS user_name, u.email AS user_email, u.phone AS user_phone,
           m.kind AS media_kind,
           COALESCE(b.title, mg.title, d.title, ar.title) AS media_title,
           m.condition AS media_condition
    FROM loans l
    JOIN users u ON u.id = l.user_id
    JOIN media m ON m.id = l.media_id
    LEFT JOIN books b ON b.media_id = m.id
    LEFT JOIN magazines mg ON mg.media_id = m.id
    LEFT JOIN dvds d ON d.media_id = m.id
    LEFT JOIN articles ar ON ar.media_id = m.id
"#;

/// Storage operations the loan lifecycle depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoansStore: Send + Sync {
    async fn user_exists(&self, user_id: i32) -> AppResult<bool>;

    async fn media_exists(&self, media_id: i32) -> AppResult<bool>;

    /// An active, unreturned loan exists for the media
    async fn media_has_open_loan(&self, media_id: i32) -> AppResult<bool>;

    /// The user has a penalty with no end date or ending after `today`
    async fn user_has_active_penalty(&self, user_id: i32, today: NaiveDate) -> AppResult<bool>;

    /// Insert an active loan. Losing the race for the media is a `Conflict`.
    async fn insert_loan(&self, loan: &NewLoan) -> AppResult<Loan>;

    async fn get_loan(&self, id: i32) -> AppResult<Option<Loan>>;

    async fn get_loan_details(&self, id: i32) -> AppResult<Option<LoanDetails>>;

    /// Close the loan, update the media condition and insert the penalty,
    /// all in one transaction.
    async fn complete_return(&self, plan: &ReturnPlan) -> AppResult<(Loan, Option<Penalty>)>;

    /// Move the expected return date of a still-open loan
    async fn update_expected_return(&self, loan_id: i32, expected_return_on: NaiveDate) -> AppResult<Loan>;

    /// Open loans due before `today`, oldest due date first
    async fn overdue_loans(&self, today: NaiveDate) -> AppResult<Vec<LoanDetails>>;

    async fn list_loans(
        &self,
        status: Option<LoanStatus>,
        user_id: Option<i32>,
        window: PageRequest,
    ) -> AppResult<(Vec<LoanDetails>, i64)>;

    async fn user_loans(&self, user_id: i32, open_only: bool) -> AppResult<Vec<LoanDetails>>;
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoansStore for LoansRepository {
    async fn user_exists(&self, user_id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn media_exists(&self, media_id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
            .bind(media_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn media_has_open_loan(&self, media_id: i32) -> AppResult<bool> {
        let open = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE media_id = $1 AND status = 'active' AND returned_on IS NULL
            )
            "#,
        )
        .bind(media_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(open)
    }

    async fn user_has_active_penalty(&self, user_id: i32, today: NaiveDate) -> AppResult<bool> {
        let active = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM penalties
                WHERE user_id = $1 AND (ends_on IS NULL OR ends_on > $2)
            )
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(active)
    }

    async fn insert_loan(&self, loan: &NewLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (media_id, user_id, borrowed_on, expected_return_on, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan.media_id)
        .bind(loan.user_id)
        .bind(loan.borrowed_on)
        .bind(loan.expected_return_on)
        .bind(LoanStatus::Active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::NotFound("User or media not found".to_string())
            }
            other => AppError::unique_violation_as_conflict(other, "Media already on loan"),
        })
    }

    async fn get_loan(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn get_loan_details(&self, id: i32) -> AppResult<Option<LoanDetails>> {
        let sql = format!("{DETAILS_SELECT} WHERE l.id = $1");
        let loan = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn complete_return(&self, plan: &ReturnPlan) -> AppResult<(Loan, Option<Penalty>)> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(plan.loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", plan.loan_id)))?;

        if !locked.is_open() {
            return Err(AppError::InvalidState("Loan already returned".to_string()));
        }
        if locked.expected_return_on != plan.expected_return_on {
            return Err(AppError::Conflict(
                "Loan was renewed while being returned".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET returned_on = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(plan.loan_id)
        .bind(plan.returned_on)
        .bind(LoanStatus::Returned)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(condition) = &plan.condition {
            sqlx::query("UPDATE media SET condition = $2, updated_at = NOW() WHERE id = $1")
                .bind(loan.media_id)
                .bind(condition)
                .execute(&mut *tx)
                .await?;
        }

        let penalty = match &plan.penalty {
            Some(new) => Some(
                sqlx::query_as::<_, Penalty>(
                    r#"
                    INSERT INTO penalties (description, ends_on, amount, user_id, loan_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING *
                    "#,
                )
                .bind(&new.description)
                .bind(new.ends_on)
                .bind(new.amount)
                .bind(new.user_id)
                .bind(new.loan_id)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        tx.commit().await?;
        Ok((loan, penalty))
    }

    async fn update_expected_return(&self, loan_id: i32, expected_return_on: NaiveDate) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET expected_return_on = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND returned_on IS NULL
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(expected_return_on)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::InvalidState("Loan is not active".to_string()))
    }

    async fn overdue_loans(&self, today: NaiveDate) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            r#"{DETAILS_SELECT}
            WHERE l.status = 'active' AND l.returned_on IS NULL AND l.expected_return_on < $1
            ORDER BY l.expected_return_on ASC, l.id ASC"#
        );
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    async fn list_loans(
        &self,
        status: Option<LoanStatus>,
        user_id: Option<i32>,
        window: PageRequest,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE ($1::loan_status IS NULL OR status = $1) AND ($2::int IS NULL OR user_id = $2)
            "#,
        )
        .bind(status)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"{DETAILS_SELECT}
            WHERE ($1::loan_status IS NULL OR l.status = $1) AND ($2::int IS NULL OR l.user_id = $2)
            ORDER BY l.borrowed_on DESC, l.id DESC
            LIMIT $3 OFFSET $4"#
        );
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(status)
            .bind(user_id)
            .bind(window.limit)
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((loans, total))
    }

    async fn user_loans(&self, user_id: i32, open_only: bool) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            r#"{DETAILS_SELECT}
            WHERE l.user_id = $1 AND (NOT $2 OR l.returned_on IS NULL)
            ORDER BY l.borrowed_on DESC, l.id DESC"#
        );
        let loans = sqlx::query_as::<_, LoanDetails>(&sql)
            .bind(user_id)
            .bind(open_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }
}
