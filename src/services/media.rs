//! Media catalog service

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, Authorship},
        media::{CreateMedia, Media, MediaQuery, UpdateMedia},
        pagination::PaginatedResponse,
    },
    repository::{search_pattern, Repository},
};

#[derive(Clone)]
pub struct MediaService {
    repository: Repository,
}

impl MediaService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &MediaQuery) -> AppResult<PaginatedResponse<Media>> {
        let window = query.page_request();
        let pattern = search_pattern(query.search.as_deref());
        let (media, total) = self
            .repository
            .media
            .list(query.kind, query.library_id, pattern.as_deref(), query.available, window)
            .await?;
        Ok(PaginatedResponse::new(media, total, window))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Media> {
        self.repository.media.get_by_id(id).await
    }

    pub async fn create(&self, media: CreateMedia) -> AppResult<Media> {
        if let Some(library_id) = media.library_id {
            if !self.repository.libraries.exists(library_id).await? {
                return Err(AppError::NotFound(format!(
                    "Library with id {} not found",
                    library_id
                )));
            }
        }

        let created = self.repository.media.create(&media).await?;
        tracing::info!("Media {} created ({} {:?})", created.id, created.kind(), created.details.title());
        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdateMedia) -> AppResult<Media> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        self.repository.media.update(id, patch).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.media.delete(id).await?;
        tracing::info!("Media {} deleted", id);
        Ok(())
    }

    pub async fn authors(&self, media_id: i32) -> AppResult<Vec<Author>> {
        if !self.repository.media.exists(media_id).await? {
            return Err(AppError::NotFound(format!("Media with id {} not found", media_id)));
        }
        self.repository.media.authors(media_id).await
    }

    pub async fn add_author(&self, media_id: i32, author_id: i32) -> AppResult<Authorship> {
        if !self.repository.media.exists(media_id).await? {
            return Err(AppError::NotFound(format!("Media with id {} not found", media_id)));
        }
        if !self.repository.authors.exists(author_id).await? {
            return Err(AppError::NotFound(format!("Author with id {} not found", author_id)));
        }

        let link = self.repository.media.add_author(media_id, author_id).await?;
        tracing::info!("Author {} linked to media {}", author_id, media_id);
        Ok(link)
    }

    pub async fn remove_author(&self, media_id: i32, author_id: i32) -> AppResult<()> {
        self.repository.media.remove_author(media_id, author_id).await
    }
}
