//! Global search endpoint

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{author::Author, media::Media, user::User},
    AppState,
};

use super::ValidatedQuery;

#[derive(Debug, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Term matched against titles, ISBNs, author names and user names or emails
    #[serde(default)]
    pub q: String,
}

/// Best hits per entity type
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub media: Vec<Media>,
    pub authors: Vec<Author>,
    pub users: Vec<User>,
}

/// Search media, authors and users at once
#[utoipa::path(
    get,
    path = "/search",
    tag = "search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results", body = SearchResults),
        (status = 400, description = "Missing search term", body = crate::error::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> AppResult<Json<SearchResults>> {
    let results = state.services.search.search(&query.q).await?;
    Ok(Json(results))
}
