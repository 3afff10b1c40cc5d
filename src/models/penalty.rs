//! Penalty model and the late-return fine rule

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::config::LoanPolicy;

use super::loan::Loan;
use super::pagination::PageRequest;

pub const LATE_RETURN_DESCRIPTION: &str = "Late return fine";

/// Penalty model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Penalty {
    pub id: i32,
    pub description: String,
    /// Last day before the penalty lapses; `None` never lapses
    pub ends_on: Option<NaiveDate>,
    #[schema(value_type = String, example = "6.00")]
    pub amount: Decimal,
    pub user_id: i32,
    pub loan_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Penalty {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.ends_on.map_or(true, |ends_on| ends_on > today)
    }
}

/// Penalty to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewPenalty {
    pub description: String,
    pub ends_on: Option<NaiveDate>,
    pub amount: Decimal,
    pub user_id: i32,
    pub loan_id: Option<i32>,
}

impl NewPenalty {
    /// Fine owed for returning `loan` on `returned_on`, or `None` when on time.
    ///
    /// Each whole day past the expected date costs `daily_fine`; the penalty
    /// stays active for `penalty_days` after the return.
    pub fn for_late_return(policy: &LoanPolicy, loan: &Loan, returned_on: NaiveDate) -> Option<Self> {
        let days_late = (returned_on - loan.expected_return_on).num_days();
        if days_late <= 0 {
            return None;
        }

        Some(Self {
            description: LATE_RETURN_DESCRIPTION.to_string(),
            ends_on: Some(returned_on + Duration::days(policy.penalty_days)),
            amount: Decimal::from(days_late) * policy.daily_fine,
            user_id: loan.user_id,
            loan_id: Some(loan.id),
        })
    }
}

/// Penalty list filters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PenaltyQuery {
    pub user_id: Option<i32>,
    /// `true` for active penalties only, `false` for lapsed ones only
    pub active: Option<bool>,
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl PenaltyQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Manual penalty creation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePenalty {
    pub user_id: i32,
    pub loan_id: Option<i32>,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub ends_on: Option<NaiveDate>,
    #[schema(value_type = String, example = "10.00")]
    pub amount: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePenalty {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub ends_on: Option<Option<NaiveDate>>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
}

impl UpdatePenalty {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.ends_on.is_none() && self.amount.is_none()
    }

    pub fn apply(self, penalty: &mut Penalty) {
        if let Some(description) = self.description {
            penalty.description = description;
        }
        if let Some(ends_on) = self.ends_on {
            penalty.ends_on = ends_on;
        }
        if let Some(amount) = self.amount {
            penalty.amount = amount;
        }
    }
}

/// Amounts are money: non-negative with at most two decimal places
pub fn check_amount(amount: Decimal) -> Result<(), String> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("amount must not be negative".to_string());
    }
    if amount.normalize().scale() > 2 {
        return Err("amount must have at most two decimal places".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::LoanStatus;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_loan(expected: NaiveDate) -> Loan {
        Loan {
            id: 42,
            media_id: 7,
            user_id: 3,
            borrowed_on: date(2024, 1, 1),
            expected_return_on: expected,
            returned_on: None,
            status: LoanStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn four_days_late_costs_six() {
        let policy = LoanPolicy::default();
        let loan = open_loan(date(2024, 1, 16));

        let penalty = NewPenalty::for_late_return(&policy, &loan, date(2024, 1, 20)).unwrap();

        assert_eq!(penalty.amount, Decimal::from_str("6.00").unwrap());
        assert_eq!(penalty.amount.to_string(), "6.00");
        assert_eq!(penalty.ends_on, Some(date(2024, 2, 19)));
        assert_eq!(penalty.user_id, 3);
        assert_eq!(penalty.loan_id, Some(42));
        assert_eq!(penalty.description, LATE_RETURN_DESCRIPTION);
    }

    #[test]
    fn on_time_or_early_return_has_no_penalty() {
        let policy = LoanPolicy::default();
        let loan = open_loan(date(2024, 1, 16));

        assert!(NewPenalty::for_late_return(&policy, &loan, date(2024, 1, 16)).is_none());
        assert!(NewPenalty::for_late_return(&policy, &loan, date(2024, 1, 10)).is_none());
    }

    #[test]
    fn fine_follows_configured_rate() {
        let policy = LoanPolicy {
            daily_fine: Decimal::from_str("0.75").unwrap(),
            penalty_days: 7,
            ..LoanPolicy::default()
        };
        let loan = open_loan(date(2024, 1, 16));

        let penalty = NewPenalty::for_late_return(&policy, &loan, date(2024, 1, 26)).unwrap();

        assert_eq!(penalty.amount, Decimal::from_str("7.50").unwrap());
        assert_eq!(penalty.ends_on, Some(date(2024, 2, 2)));
    }

    #[test]
    fn penalty_is_active_until_its_end_date() {
        let mut penalty = Penalty {
            id: 1,
            description: LATE_RETURN_DESCRIPTION.into(),
            ends_on: Some(date(2024, 2, 19)),
            amount: Decimal::from_str("6.00").unwrap(),
            user_id: 3,
            loan_id: Some(42),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(penalty.is_active(date(2024, 2, 18)));
        assert!(!penalty.is_active(date(2024, 2, 19)));

        penalty.ends_on = None;
        assert!(penalty.is_active(date(2030, 1, 1)));
    }

    #[test]
    fn amount_must_be_money() {
        assert!(check_amount(Decimal::from_str("1.50").unwrap()).is_ok());
        assert!(check_amount(Decimal::ZERO).is_ok());
        assert!(check_amount(Decimal::from_str("-1").unwrap()).is_err());
        assert!(check_amount(Decimal::from_str("1.505").unwrap()).is_err());
    }
}
