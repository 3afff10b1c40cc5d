//! Statistics service: read-only dashboard aggregates

use chrono::{Local, NaiveDate};

use crate::{
    api::stats::{LibraryMediaCount, MonthlyCount, StatEntry, StatsSummary, TopMedia, TopUser},
    error::AppResult,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Entity totals plus loan and penalty activity
    pub async fn summary(&self) -> AppResult<StatsSummary> {
        let summary = sqlx::query_as::<_, StatsSummary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM libraries) AS libraries,
                (SELECT COUNT(*) FROM media) AS media,
                (SELECT COUNT(*) FROM authors) AS authors,
                (SELECT COUNT(*) FROM loans
                  WHERE status = 'active' AND returned_on IS NULL) AS active_loans,
                (SELECT COUNT(*) FROM loans
                  WHERE status = 'active' AND returned_on IS NULL
                    AND expected_return_on < $1) AS overdue_loans,
                (SELECT COUNT(*) FROM penalties
                  WHERE ends_on IS NULL OR ends_on > $1) AS active_penalties
            "#,
        )
        .bind(Self::today())
        .fetch_one(&self.repository.pool)
        .await?;

        Ok(summary)
    }

    /// Media counts per variant
    pub async fn media_by_kind(&self) -> AppResult<Vec<StatEntry>> {
        let entries = sqlx::query_as::<_, StatEntry>(
            r#"
            SELECT kind::text AS label, COUNT(*) AS value
            FROM media
            GROUP BY kind
            ORDER BY value DESC, label
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }

    /// Loan counts per status
    pub async fn loans_by_status(&self) -> AppResult<Vec<StatEntry>> {
        let entries = sqlx::query_as::<_, StatEntry>(
            r#"
            SELECT status::text AS label, COUNT(*) AS value
            FROM loans
            GROUP BY status
            ORDER BY value DESC, label
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }

    /// Media counts per library, libraries without media included
    pub async fn media_per_library(&self) -> AppResult<Vec<LibraryMediaCount>> {
        let entries = sqlx::query_as::<_, LibraryMediaCount>(
            r#"
            SELECT lib.id AS library_id, lib.name, COUNT(m.id) AS media_count
            FROM libraries lib
            LEFT JOIN media m ON m.library_id = lib.id
            GROUP BY lib.id, lib.name
            ORDER BY media_count DESC, lib.name
            "#,
        )
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }

    /// Loans started per month over the trailing twelve months, oldest first.
    /// Months without loans are reported with a zero count.
    pub async fn monthly_loans(&self) -> AppResult<Vec<MonthlyCount>> {
        let entries = sqlx::query_as::<_, MonthlyCount>(
            r#"
            SELECT months.month::date AS month, COUNT(l.id) AS total
            FROM generate_series(
                date_trunc('month', $1::timestamp) - INTERVAL '11 months',
                date_trunc('month', $1::timestamp),
                INTERVAL '1 month'
            ) AS months(month)
            LEFT JOIN loans l ON date_trunc('month', l.borrowed_on::timestamp) = months.month
            GROUP BY months.month
            ORDER BY months.month
            "#,
        )
        .bind(Self::today())
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }

    /// Most borrowed media items
    pub async fn top_media(&self, limit: i64) -> AppResult<Vec<TopMedia>> {
        let entries = sqlx::query_as::<_, TopMedia>(
            r#"
            SELECT m.id AS media_id, m.kind,
                   COALESCE(b.title, mg.title, d.title, ar.title) AS title,
                   COUNT(l.id) AS total_loans
            FROM loans l
            JOIN media m ON m.id = l.media_id
            LEFT JOIN books b ON b.media_id = m.id
            LEFT JOIN magazines mg ON mg.media_id = m.id
            LEFT JOIN dvds d ON d.media_id = m.id
            LEFT JOIN articles ar ON ar.media_id = m.id
            GROUP BY m.id, m.kind, b.title, mg.title, d.title, ar.title
            ORDER BY total_loans DESC, m.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }

    /// Users with the most loans
    pub async fn top_users(&self, limit: i64) -> AppResult<Vec<TopUser>> {
        let entries = sqlx::query_as::<_, TopUser>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, COUNT(l.id) AS total_loans
            FROM loans l
            JOIN users u ON u.id = l.user_id
            GROUP BY u.id, u.name, u.email
            ORDER BY total_loans DESC, u.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.repository.pool)
        .await?;

        Ok(entries)
    }
}
