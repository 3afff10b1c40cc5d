//! Library management service

use crate::{
    error::{AppError, AppResult},
    models::{
        library::{CreateLibrary, Library, LibraryQuery, UpdateLibrary},
        media::{CatalogQuery, Media},
        pagination::PaginatedResponse,
    },
    repository::{search_pattern, Repository},
};

#[derive(Clone)]
pub struct LibrariesService {
    repository: Repository,
}

impl LibrariesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &LibraryQuery) -> AppResult<PaginatedResponse<Library>> {
        let window = query.page_request();
        let pattern = search_pattern(query.search.as_deref());
        let (libraries, total) = self
            .repository
            .libraries
            .list(pattern.as_deref(), window)
            .await?;
        Ok(PaginatedResponse::new(libraries, total, window))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        self.repository.libraries.get_by_id(id).await
    }

    pub async fn create(&self, library: CreateLibrary) -> AppResult<Library> {
        let created = self.repository.libraries.create(&library).await?;
        tracing::info!("Library {} created", created.id);
        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdateLibrary) -> AppResult<Library> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        self.repository.libraries.update(id, patch).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.libraries.delete(id).await?;
        tracing::info!("Library {} deleted", id);
        Ok(())
    }

    /// Media owned by a library
    pub async fn media(&self, id: i32, query: &CatalogQuery) -> AppResult<PaginatedResponse<Media>> {
        if !self.repository.libraries.exists(id).await? {
            return Err(AppError::NotFound(format!("Library with id {} not found", id)));
        }

        let window = query.page_request();
        let pattern = search_pattern(query.search.as_deref());
        let (media, total) = self
            .repository
            .media
            .list(None, Some(id), pattern.as_deref(), query.available, window)
            .await?;
        Ok(PaginatedResponse::new(media, total, window))
    }
}
