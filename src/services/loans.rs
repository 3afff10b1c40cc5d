//! Loan lifecycle service: borrow, renew, return and late-return penalties

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};

use crate::{
    config::LoanPolicy,
    error::{AppError, AppResult},
    models::{
        loan::{
            CreateLoan, Loan, LoanDetails, LoanQuery, NewLoan, RenewLoan, ReturnLoan,
            ReturnOutcome, ReturnPlan,
        },
        pagination::PaginatedResponse,
        penalty::NewPenalty,
    },
    repository::loans::LoansStore,
};

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoansStore>,
    policy: LoanPolicy,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoansStore>, policy: LoanPolicy) -> Self {
        Self { store, policy }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    /// Borrow a media item.
    ///
    /// Checks run in order and the first failure wins: user exists, media
    /// exists, media not already on loan, user has no active penalty.
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<Loan> {
        let expected_return_on = match request.expected_return_on {
            Some(date) if date < request.borrowed_on => {
                return Err(AppError::Validation(
                    "expected_return_on must not precede borrowed_on".to_string(),
                ))
            }
            Some(date) => date,
            None => request.borrowed_on + Duration::days(self.policy.default_loan_days),
        };

        if !self.store.user_exists(request.user_id).await? {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                request.user_id
            )));
        }
        if !self.store.media_exists(request.media_id).await? {
            return Err(AppError::NotFound(format!(
                "Media with id {} not found",
                request.media_id
            )));
        }
        if self.store.media_has_open_loan(request.media_id).await? {
            tracing::warn!("Loan refused: media {} already on loan", request.media_id);
            return Err(AppError::Conflict("Media already on loan".to_string()));
        }
        if self
            .store
            .user_has_active_penalty(request.user_id, Self::today())
            .await?
        {
            tracing::warn!("Loan refused: user {} has an active penalty", request.user_id);
            return Err(AppError::Conflict("User has active penalty".to_string()));
        }

        let loan = self
            .store
            .insert_loan(&NewLoan {
                media_id: request.media_id,
                user_id: request.user_id,
                borrowed_on: request.borrowed_on,
                expected_return_on,
            })
            .await?;

        tracing::info!(
            "Loan {} created: media {} to user {}, due {}",
            loan.id,
            loan.media_id,
            loan.user_id,
            loan.expected_return_on
        );
        Ok(loan)
    }

    /// Return a loan, recording the media condition and any late fine
    pub async fn return_loan(&self, loan_id: i32, request: ReturnLoan) -> AppResult<ReturnOutcome> {
        let loan = self.find(loan_id).await?;

        if !loan.is_open() {
            return Err(AppError::InvalidState("Loan already returned".to_string()));
        }
        if request.returned_on < loan.borrowed_on {
            return Err(AppError::Validation(
                "returned_on must not precede borrowed_on".to_string(),
            ));
        }

        let plan = ReturnPlan {
            loan_id,
            expected_return_on: loan.expected_return_on,
            returned_on: request.returned_on,
            condition: request.condition,
            penalty: NewPenalty::for_late_return(&self.policy, &loan, request.returned_on),
        };

        let (loan, penalty) = self.store.complete_return(&plan).await?;

        match &penalty {
            Some(p) => tracing::info!(
                "Loan {} returned late by user {}: penalty {} of {} until {:?}",
                loan.id,
                loan.user_id,
                p.id,
                p.amount,
                p.ends_on
            ),
            None => tracing::info!("Loan {} returned on time", loan.id),
        }

        Ok(ReturnOutcome { loan, penalty })
    }

    /// Move the expected return date of an open loan
    pub async fn renew_loan(&self, loan_id: i32, request: RenewLoan) -> AppResult<Loan> {
        let loan = self.find(loan_id).await?;

        if !loan.is_open() {
            return Err(AppError::InvalidState("Loan is not active".to_string()));
        }
        if self
            .store
            .user_has_active_penalty(loan.user_id, Self::today())
            .await?
        {
            tracing::warn!("Renewal refused: user {} has an active penalty", loan.user_id);
            return Err(AppError::Conflict("User has active penalty".to_string()));
        }
        if request.expected_return_on < loan.borrowed_on {
            return Err(AppError::Validation(
                "expected_return_on must not precede borrowed_on".to_string(),
            ));
        }

        let renewed = self
            .store
            .update_expected_return(loan_id, request.expected_return_on)
            .await?;

        tracing::info!("Loan {} renewed until {}", renewed.id, renewed.expected_return_on);
        Ok(renewed)
    }

    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.store
            .get_loan_details(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }

    pub async fn list_loans(&self, query: &LoanQuery) -> AppResult<PaginatedResponse<LoanDetails>> {
        let window = query.page_request();
        let (loans, total) = self
            .store
            .list_loans(query.status, query.user_id, window)
            .await?;
        Ok(PaginatedResponse::new(loans, total, window))
    }

    /// Open loans past their expected return date, oldest due first
    pub async fn overdue_loans(&self) -> AppResult<Vec<LoanDetails>> {
        self.store.overdue_loans(Self::today()).await
    }

    pub async fn user_loans(&self, user_id: i32, open_only: bool) -> AppResult<Vec<LoanDetails>> {
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        self.store.user_loans(user_id, open_only).await
    }

    async fn find(&self, loan_id: i32) -> AppResult<Loan> {
        self.store
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{loan::LoanStatus, penalty::Penalty},
        repository::loans::MockLoansStore,
    };
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service(store: MockLoansStore) -> LoansService {
        LoansService::new(Arc::new(store), LoanPolicy::default())
    }

    fn loan(id: i32, expected: NaiveDate) -> Loan {
        Loan {
            id,
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

    fn request(expected: Option<NaiveDate>) -> CreateLoan {
        CreateLoan {
            media_id: 7,
            user_id: 3,
            borrowed_on: date(2024, 1, 1),
            expected_return_on: expected,
        }
    }

    /// A store where every borrowing precondition passes
    fn lenient_store() -> MockLoansStore {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(true));
        store.expect_media_exists().returning(|_| Ok(true));
        store.expect_media_has_open_loan().returning(|_| Ok(false));
        store
            .expect_user_has_active_penalty()
            .returning(|_, _| Ok(false));
        store
    }

    #[tokio::test]
    async fn expected_return_defaults_to_fifteen_days() {
        let mut store = lenient_store();
        store
            .expect_insert_loan()
            .withf(|new| new.expected_return_on == date(2024, 1, 16))
            .times(1)
            .returning(|new| Ok(loan(1, new.expected_return_on)));

        let created = service(store).create_loan(request(None)).await.unwrap();

        assert_eq!(created.expected_return_on, date(2024, 1, 16));
        assert_eq!(created.status, LoanStatus::Active);
        assert_eq!(created.returned_on, None);
    }

    #[tokio::test]
    async fn explicit_expected_return_is_kept() {
        let mut store = lenient_store();
        store
            .expect_insert_loan()
            .withf(|new| new.expected_return_on == date(2024, 1, 5))
            .times(1)
            .returning(|new| Ok(loan(1, new.expected_return_on)));

        let created = service(store)
            .create_loan(request(Some(date(2024, 1, 5))))
            .await
            .unwrap();
        assert_eq!(created.expected_return_on, date(2024, 1, 5));
    }

    #[tokio::test]
    async fn expected_return_before_borrow_is_rejected_before_any_lookup() {
        let store = MockLoansStore::new();

        let err = service(store)
            .create_loan(request(Some(date(2023, 12, 31))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_user_wins_over_missing_media() {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(false));
        store.expect_media_exists().never();
        store.expect_insert_loan().never();

        let err = service(store).create_loan(request(None)).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("User")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_media_is_not_found() {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(true));
        store.expect_media_exists().returning(|_| Ok(false));
        store.expect_insert_loan().never();

        let err = service(store).create_loan(request(None)).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("Media")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn media_on_loan_is_a_conflict() {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(true));
        store.expect_media_exists().returning(|_| Ok(true));
        store.expect_media_has_open_loan().returning(|_| Ok(true));
        store.expect_user_has_active_penalty().never();
        store.expect_insert_loan().never();

        let err = service(store).create_loan(request(None)).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "Media already on loan"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn active_penalty_blocks_borrowing() {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(true));
        store.expect_media_exists().returning(|_| Ok(true));
        store.expect_media_has_open_loan().returning(|_| Ok(false));
        store
            .expect_user_has_active_penalty()
            .returning(|_, _| Ok(true));
        store.expect_insert_loan().never();

        let err = service(store).create_loan(request(None)).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, "User has active penalty"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn losing_the_insert_race_is_a_conflict() {
        let mut store = lenient_store();
        store
            .expect_insert_loan()
            .returning(|_| Err(AppError::Conflict("Media already on loan".to_string())));

        let err = service(store).create_loan(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn late_return_charges_per_day_and_records_condition() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store
            .expect_complete_return()
            .withf(|plan| {
                let penalty = plan.penalty.as_ref();
                plan.returned_on == date(2024, 1, 20)
                    && plan.expected_return_on == date(2024, 1, 16)
                    && plan.condition.as_deref() == Some("worn")
                    && penalty.map(|p| p.amount) == Some(Decimal::new(600, 2))
                    && penalty.and_then(|p| p.ends_on) == Some(date(2024, 2, 19))
                    && penalty.map(|p| (p.user_id, p.loan_id)) == Some((3, Some(42)))
            })
            .times(1)
            .returning(|plan| {
                let mut returned = loan(plan.loan_id, plan.expected_return_on);
                returned.returned_on = Some(plan.returned_on);
                returned.status = LoanStatus::Returned;
                let penalty = plan.penalty.as_ref().map(|p| Penalty {
                    id: 1,
                    description: p.description.clone(),
                    ends_on: p.ends_on,
                    amount: p.amount,
                    user_id: p.user_id,
                    loan_id: p.loan_id,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                });
                Ok((returned, penalty))
            });

        let outcome = service(store)
            .return_loan(
                42,
                ReturnLoan {
                    returned_on: date(2024, 1, 20),
                    condition: Some("worn".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.loan.status, LoanStatus::Returned);
        assert_eq!(outcome.loan.returned_on, Some(date(2024, 1, 20)));
        let penalty = outcome.penalty.unwrap();
        assert_eq!(penalty.amount.to_string(), "6.00");
        assert_eq!(penalty.ends_on, Some(date(2024, 2, 19)));
    }

    #[tokio::test]
    async fn on_time_return_has_no_penalty() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store
            .expect_complete_return()
            .withf(|plan| plan.penalty.is_none() && plan.condition.is_none())
            .times(1)
            .returning(|plan| {
                let mut returned = loan(plan.loan_id, plan.expected_return_on);
                returned.returned_on = Some(plan.returned_on);
                returned.status = LoanStatus::Returned;
                Ok((returned, None))
            });

        let outcome = service(store)
            .return_loan(
                5,
                ReturnLoan {
                    returned_on: date(2024, 1, 16),
                    condition: None,
                },
            )
            .await
            .unwrap();
        assert!(outcome.penalty.is_none());
    }

    #[tokio::test]
    async fn second_return_is_an_invalid_state() {
        let mut store = MockLoansStore::new();
        store.expect_get_loan().returning(|id| {
            let mut returned = loan(id, date(2024, 1, 16));
            returned.returned_on = Some(date(2024, 1, 20));
            returned.status = LoanStatus::Returned;
            Ok(Some(returned))
        });
        store.expect_complete_return().never();

        let err = service(store)
            .return_loan(
                42,
                ReturnLoan {
                    returned_on: date(2024, 1, 21),
                    condition: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn returning_unknown_loan_is_not_found() {
        let mut store = MockLoansStore::new();
        store.expect_get_loan().returning(|_| Ok(None));

        let err = service(store)
            .return_loan(
                99,
                ReturnLoan {
                    returned_on: date(2024, 1, 21),
                    condition: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn return_before_borrow_date_is_rejected() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store.expect_complete_return().never();

        let err = service(store)
            .return_loan(
                42,
                ReturnLoan {
                    returned_on: date(2023, 12, 1),
                    condition: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn renewal_is_refused_while_penalised() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store
            .expect_user_has_active_penalty()
            .withf(|user_id, _| *user_id == 3)
            .returning(|_, _| Ok(true));
        store.expect_update_expected_return().never();

        let err = service(store)
            .renew_loan(
                42,
                RenewLoan {
                    expected_return_on: date(2024, 1, 30),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn renewal_of_returned_loan_is_an_invalid_state() {
        let mut store = MockLoansStore::new();
        store.expect_get_loan().returning(|id| {
            let mut returned = loan(id, date(2024, 1, 16));
            returned.returned_on = Some(date(2024, 1, 10));
            returned.status = LoanStatus::Returned;
            Ok(Some(returned))
        });
        store.expect_user_has_active_penalty().never();
        store.expect_update_expected_return().never();

        let err = service(store)
            .renew_loan(
                42,
                RenewLoan {
                    expected_return_on: date(2024, 1, 30),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn renewal_moves_the_expected_date() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store
            .expect_user_has_active_penalty()
            .returning(|_, _| Ok(false));
        store
            .expect_update_expected_return()
            .withf(|id, new_date| *id == 42 && *new_date == date(2024, 1, 30))
            .times(1)
            .returning(|id, new_date| Ok(loan(id, new_date)));

        let renewed = service(store)
            .renew_loan(
                42,
                RenewLoan {
                    expected_return_on: date(2024, 1, 30),
                },
            )
            .await
            .unwrap();
        assert_eq!(renewed.expected_return_on, date(2024, 1, 30));
    }

    #[tokio::test]
    async fn renewal_may_shorten_but_not_precede_the_borrow_date() {
        let mut store = MockLoansStore::new();
        store
            .expect_get_loan()
            .returning(|id| Ok(Some(loan(id, date(2024, 1, 16)))));
        store
            .expect_user_has_active_penalty()
            .returning(|_, _| Ok(false));
        store
            .expect_update_expected_return()
            .withf(|_, new_date| *new_date == date(2024, 1, 10))
            .times(1)
            .returning(|id, new_date| Ok(loan(id, new_date)));
        let service = service(store);

        let err = service
            .renew_loan(
                42,
                RenewLoan {
                    expected_return_on: date(2023, 12, 31),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let renewed = service
            .renew_loan(
                42,
                RenewLoan {
                    expected_return_on: date(2024, 1, 10),
                },
            )
            .await
            .unwrap();
        assert_eq!(renewed.expected_return_on, date(2024, 1, 10));
    }

    #[tokio::test]
    async fn user_loans_require_an_existing_user() {
        let mut store = MockLoansStore::new();
        store.expect_user_exists().returning(|_| Ok(false));
        store.expect_user_loans().never();

        let err = service(store).user_loans(12, true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
