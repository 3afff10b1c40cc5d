//! Global search across the catalog, authors and users

use crate::{
    api::search::SearchResults,
    error::{AppError, AppResult},
    models::pagination::PageRequest,
    repository::{search_pattern, Repository},
};

/// Hits returned per entity type
pub const SEARCH_HITS: i64 = 5;

#[derive(Clone)]
pub struct SearchService {
    repository: Repository,
}

impl SearchService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn search(&self, q: &str) -> AppResult<SearchResults> {
        let pattern = search_pattern(Some(q))
            .ok_or_else(|| AppError::Validation("q: search term is required".to_string()))?;
        let window = PageRequest::new(Some(1), Some(SEARCH_HITS));

        let ((media, _), (authors, _), (users, _)) = tokio::try_join!(
            self.repository.media.list(None, None, Some(pattern.as_str()), None, window),
            self.repository.authors.list(Some(pattern.as_str()), window),
            self.repository.users.list(Some(pattern.as_str()), window),
        )?;

        tracing::debug!(
            "Search {:?}: {} media, {} authors, {} users",
            q,
            media.len(),
            authors.len(),
            users.len()
        );

        Ok(SearchResults {
            media,
            authors,
            users,
        })
    }
}
