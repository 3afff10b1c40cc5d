//! User management service

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::PaginatedResponse,
        user::{CreateUser, UpdateUser, User, UserQuery},
    },
    repository::{search_pattern, Repository},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<PaginatedResponse<User>> {
        let window = query.page_request();
        let pattern = search_pattern(query.search.as_deref());
        let (users, total) = self.repository.users.list(pattern.as_deref(), window).await?;
        Ok(PaginatedResponse::new(users, total, window))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn create(&self, user: CreateUser) -> AppResult<User> {
        let created = self.repository.users.create(&user).await?;
        tracing::info!("User {} created", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdateUser) -> AppResult<User> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        self.repository.users.update(id, patch).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("User {} deleted", id);
        Ok(())
    }
}
