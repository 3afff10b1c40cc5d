//! Loan management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        loan::{CreateLoan, Loan, LoanDetails, LoanQuery, RenewLoan, ReturnLoan, ReturnOutcome},
        pagination::PaginatedResponse,
    },
    AppState,
};

use super::{ValidatedJson, ValidatedQuery};

/// List loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "List of loans", body = PaginatedResponse<LoanDetails>),
        (status = 400, description = "Invalid filter or pagination", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    let loans = state.services.loans.list_loans(&query).await?;
    Ok(Json(loans))
}

/// List open loans past their expected return date
#[utoipa::path(
    get,
    path = "/loans/overdue",
    tag = "loans",
    responses(
        (status = 200, description = "Overdue loans, oldest due date first", body = Vec<LoanDetails>)
    )
)]
pub async fn list_overdue_loans(State(state): State<AppState>) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.overdue_loans().await?;
    Ok(Json(loans))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(loan))
}

/// Lend a media item to a user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid dates", body = crate::error::ErrorResponse),
        (status = 404, description = "User or media not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Media already on loan or user has an active penalty", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a loan, fining late returns
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = ReturnOutcome),
        (status = 400, description = "Return date before borrow date", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ReturnLoan>,
) -> AppResult<Json<ReturnOutcome>> {
    let outcome = state.services.loans.return_loan(id, request).await?;
    Ok(Json(outcome))
}

/// Move the expected return date of an open loan
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = RenewLoan,
    responses(
        (status = 200, description = "Loan renewed", body = Loan),
        (status = 400, description = "New date precedes the borrow date", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan not active or user has an active penalty", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_loan(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<RenewLoan>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.renew_loan(id, request).await?;
    Ok(Json(loan))
}
