//! Author management service

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{check_lifespan, Author, AuthorQuery, CreateAuthor, UpdateAuthor},
        media::Media,
        pagination::PaginatedResponse,
    },
    repository::{search_pattern, Repository},
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &AuthorQuery) -> AppResult<PaginatedResponse<Author>> {
        let window = query.page_request();
        let pattern = search_pattern(query.search.as_deref());
        let (authors, total) = self.repository.authors.list(pattern.as_deref(), window).await?;
        Ok(PaginatedResponse::new(authors, total, window))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create(&self, author: CreateAuthor) -> AppResult<Author> {
        check_lifespan(author.birth_date, author.death_date).map_err(AppError::Validation)?;

        let created = self.repository.authors.create(&author).await?;
        tracing::info!("Author {} created", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdateAuthor) -> AppResult<Author> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        self.repository
            .authors
            .update(id, patch, |author| {
                check_lifespan(author.birth_date, author.death_date).map_err(AppError::Validation)
            })
            .await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Author {} deleted", id);
        Ok(())
    }

    /// Media credited to an author
    pub async fn works(&self, id: i32) -> AppResult<Vec<Media>> {
        if !self.repository.authors.exists(id).await? {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        self.repository.media.works(id).await
    }
}
