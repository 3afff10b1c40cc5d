//! Penalty management service

use chrono::Local;

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PaginatedResponse,
        penalty::{check_amount, CreatePenalty, Penalty, PenaltyQuery, UpdatePenalty},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct PenaltiesService {
    repository: Repository,
}

impl PenaltiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &PenaltyQuery) -> AppResult<PaginatedResponse<Penalty>> {
        let window = query.page_request();
        let today = Local::now().date_naive();
        let (penalties, total) = self
            .repository
            .penalties
            .list(query.user_id, query.active, today, window)
            .await?;
        Ok(PaginatedResponse::new(penalties, total, window))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Penalty> {
        self.repository.penalties.get_by_id(id).await
    }

    pub async fn for_user(&self, user_id: i32) -> AppResult<Vec<Penalty>> {
        if !self.repository.users.exists(user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        self.repository.penalties.for_user(user_id).await
    }

    /// Record a penalty by hand (outside the late-return flow)
    pub async fn create(&self, penalty: CreatePenalty) -> AppResult<Penalty> {
        check_amount(penalty.amount).map_err(AppError::Validation)?;
        if !self.repository.users.exists(penalty.user_id).await? {
            return Err(AppError::NotFound(format!(
                "User with id {} not found",
                penalty.user_id
            )));
        }

        let created = self.repository.penalties.create(&penalty).await?;
        tracing::info!(
            "Penalty {} created for user {}: {}",
            created.id,
            created.user_id,
            created.amount
        );
        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdatePenalty) -> AppResult<Penalty> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        if let Some(amount) = patch.amount {
            check_amount(amount).map_err(AppError::Validation)?;
        }
        self.repository.penalties.update(id, patch).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.penalties.delete(id).await?;
        tracing::info!("Penalty {} deleted", id);
        Ok(())
    }
}
