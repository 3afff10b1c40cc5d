//! Loan (borrow) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::media::MediaKind;
use super::pagination::PageRequest;
use super::penalty::NewPenalty;

/// Loan lifecycle status (`loan_status` in the database)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
}

/// Loan model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub media_id: i32,
    pub user_id: i32,
    pub borrowed_on: NaiveDate,
    pub expected_return_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Active and not yet returned
    pub fn is_open(&self) -> bool {
        self.status == LoanStatus::Active && self.returned_on.is_none()
    }
}

/// Loan joined with borrower and media summary
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub loan: Loan,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub media_kind: MediaKind,
    pub media_title: Option<String>,
    pub media_condition: Option<String>,
}

/// Loan list filters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub user_id: Option<i32>,
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl LoanQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Filters for a single user's loans
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserLoansQuery {
    /// Only loans that have not been returned yet
    #[serde(default)]
    pub open_only: bool,
}

/// Create loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    pub media_id: i32,
    pub user_id: i32,
    pub borrowed_on: NaiveDate,
    /// Defaults to `borrowed_on` plus the configured loan period
    pub expected_return_on: Option<NaiveDate>,
}

/// Return loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnLoan {
    pub returned_on: NaiveDate,
    /// New condition note for the returned media
    #[validate(length(min = 1, message = "condition must not be empty"))]
    pub condition: Option<String>,
}

/// Renew loan request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RenewLoan {
    pub expected_return_on: NaiveDate,
}

/// Fully resolved loan ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub media_id: i32,
    pub user_id: i32,
    pub borrowed_on: NaiveDate,
    pub expected_return_on: NaiveDate,
}

/// Everything a return writes, applied in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPlan {
    pub loan_id: i32,
    /// Expected date the penalty was computed against
    pub expected_return_on: NaiveDate,
    pub returned_on: NaiveDate,
    pub condition: Option<String>,
    pub penalty: Option<NewPenalty>,
}

/// Result of a completed return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub loan: Loan,
    pub penalty: Option<super::penalty::Penalty>,
}
