//! Statistics endpoints

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{error::AppResult, models::media::MediaKind, AppState};

use super::ValidatedQuery;

/// Default number of rows in the top-N rankings
pub const DEFAULT_TOP_LIMIT: i64 = 10;

/// Dashboard totals
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StatsSummary {
    pub users: i64,
    pub libraries: i64,
    pub media: i64,
    pub authors: i64,
    /// Loans not yet returned
    pub active_loans: i64,
    /// Open loans past their expected return date
    pub overdue_loans: i64,
    pub active_penalties: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StatEntry {
    /// Label
    pub label: String,
    /// Value
    pub value: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct LibraryMediaCount {
    pub library_id: i32,
    pub name: String,
    pub media_count: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct MonthlyCount {
    /// First day of the month
    pub month: NaiveDate,
    pub total: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopMedia {
    pub media_id: i32,
    pub kind: MediaKind,
    pub title: Option<String>,
    pub total_loans: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct TopUser {
    pub user_id: i32,
    pub name: String,
    pub email: Option<String>,
    pub total_loans: i64,
}

/// Query parameters for the rankings
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TopQuery {
    /// Maximum number of rows (default: 10, max: 100)
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl TopQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT)
    }
}

/// Get dashboard totals
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard totals", body = StatsSummary)
    )
)]
pub async fn get_summary(State(state): State<AppState>) -> AppResult<Json<StatsSummary>> {
    let summary = state.services.stats.summary().await?;
    Ok(Json(summary))
}

/// Get media counts per kind
#[utoipa::path(
    get,
    path = "/stats/media",
    tag = "stats",
    responses(
        (status = 200, description = "Media counts per kind", body = Vec<StatEntry>)
    )
)]
pub async fn get_media_by_kind(State(state): State<AppState>) -> AppResult<Json<Vec<StatEntry>>> {
    let entries = state.services.stats.media_by_kind().await?;
    Ok(Json(entries))
}

/// Get loan counts per status
#[utoipa::path(
    get,
    path = "/stats/loans",
    tag = "stats",
    responses(
        (status = 200, description = "Loan counts per status", body = Vec<StatEntry>)
    )
)]
pub async fn get_loans_by_status(State(state): State<AppState>) -> AppResult<Json<Vec<StatEntry>>> {
    let entries = state.services.stats.loans_by_status().await?;
    Ok(Json(entries))
}

/// Get loans started per month over the last twelve months
#[utoipa::path(
    get,
    path = "/stats/loans/monthly",
    tag = "stats",
    responses(
        (status = 200, description = "Monthly loan counts, oldest first", body = Vec<MonthlyCount>)
    )
)]
pub async fn get_monthly_loans(State(state): State<AppState>) -> AppResult<Json<Vec<MonthlyCount>>> {
    let entries = state.services.stats.monthly_loans().await?;
    Ok(Json(entries))
}

/// Get media counts per library
#[utoipa::path(
    get,
    path = "/stats/libraries",
    tag = "stats",
    responses(
        (status = 200, description = "Media counts per library", body = Vec<LibraryMediaCount>)
    )
)]
pub async fn get_media_per_library(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LibraryMediaCount>>> {
    let entries = state.services.stats.media_per_library().await?;
    Ok(Json(entries))
}

/// Get the most borrowed media
#[utoipa::path(
    get,
    path = "/stats/top-media",
    tag = "stats",
    params(TopQuery),
    responses(
        (status = 200, description = "Most borrowed media", body = Vec<TopMedia>),
        (status = 400, description = "Invalid limit", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_top_media(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TopQuery>,
) -> AppResult<Json<Vec<TopMedia>>> {
    let entries = state.services.stats.top_media(query.limit()).await?;
    Ok(Json(entries))
}

/// Get the users with the most loans
#[utoipa::path(
    get,
    path = "/stats/top-users",
    tag = "stats",
    params(TopQuery),
    responses(
        (status = 200, description = "Most active borrowers", body = Vec<TopUser>),
        (status = 400, description = "Invalid limit", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_top_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<TopQuery>,
) -> AppResult<Json<Vec<TopUser>>> {
    let entries = state.services.stats.top_users(query.limit()).await?;
    Ok(Json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_limit_defaults_to_ten() {
        assert_eq!(TopQuery::default().limit(), DEFAULT_TOP_LIMIT);
        assert_eq!(TopQuery { limit: Some(3) }.limit(), 3);
    }

    #[test]
    fn top_limit_is_bounded() {
        assert!(TopQuery { limit: Some(0) }.validate().is_err());
        assert!(TopQuery { limit: Some(101) }.validate().is_err());
        assert!(TopQuery { limit: Some(100) }.validate().is_ok());
    }
}
