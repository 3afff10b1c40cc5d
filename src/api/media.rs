//! Media catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{AddAuthorship, Author, Authorship},
        media::{CatalogQuery, CreateMedia, Media, MediaKind, MediaQuery, UpdateMedia},
        pagination::PaginatedResponse,
    },
    AppState,
};

use super::{ValidatedJson, ValidatedQuery};

/// List media items
#[utoipa::path(
    get,
    path = "/media",
    tag = "media",
    params(MediaQuery),
    responses(
        (status = 200, description = "List of media", body = PaginatedResponse<Media>),
        (status = 400, description = "Invalid filter or pagination", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_media(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<MediaQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    let media = state.services.media.list(&query).await?;
    Ok(Json(media))
}

async fn list_kind(
    state: AppState,
    query: CatalogQuery,
    kind: MediaKind,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    let media = state.services.media.list(&query.into_media_query(kind)).await?;
    Ok(Json(media))
}

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "media",
    params(CatalogQuery),
    responses((status = 200, description = "List of books", body = PaginatedResponse<Media>))
)]
pub async fn list_books(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    list_kind(state, query, MediaKind::Book).await
}

/// List magazines
#[utoipa::path(
    get,
    path = "/magazines",
    tag = "media",
    params(CatalogQuery),
    responses((status = 200, description = "List of magazines", body = PaginatedResponse<Media>))
)]
pub async fn list_magazines(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    list_kind(state, query, MediaKind::Magazine).await
}

/// List DVDs
#[utoipa::path(
    get,
    path = "/dvds",
    tag = "media",
    params(CatalogQuery),
    responses((status = 200, description = "List of DVDs", body = PaginatedResponse<Media>))
)]
pub async fn list_dvds(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    list_kind(state, query, MediaKind::Dvd).await
}

/// List articles
#[utoipa::path(
    get,
    path = "/articles",
    tag = "media",
    params(CatalogQuery),
    responses((status = 200, description = "List of articles", body = PaginatedResponse<Media>))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    list_kind(state, query, MediaKind::Article).await
}

/// Get media item by ID
#[utoipa::path(
    get,
    path = "/media/{id}",
    tag = "media",
    params(("id" = i32, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media details", body = Media),
        (status = 404, description = "Media not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_media(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Media>> {
    let media = state.services.media.get_by_id(id).await?;
    Ok(Json(media))
}

/// Create a media item with its variant details
#[utoipa::path(
    post,
    path = "/media",
    tag = "media",
    request_body = CreateMedia,
    responses(
        (status = 201, description = "Media created", body = Media),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_media(
    State(state): State<AppState>,
    ValidatedJson(media): ValidatedJson<CreateMedia>,
) -> AppResult<(StatusCode, Json<Media>)> {
    let created = state.services.media.create(media).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a media item
#[utoipa::path(
    put,
    path = "/media/{id}",
    tag = "media",
    params(("id" = i32, Path, description = "Media ID")),
    request_body = UpdateMedia,
    responses(
        (status = 200, description = "Media updated", body = Media),
        (status = 400, description = "Invalid or empty patch, or variant change", body = crate::error::ErrorResponse),
        (status = 404, description = "Media or library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(patch): ValidatedJson<UpdateMedia>,
) -> AppResult<Json<Media>> {
    let updated = state.services.media.update(id, patch).await?;
    Ok(Json(updated))
}

/// Delete a media item
#[utoipa::path(
    delete,
    path = "/media/{id}",
    tag = "media",
    params(("id" = i32, Path, description = "Media ID")),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 404, description = "Media not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Media is referenced by loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_media(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    state.services.media.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the authors of a media item
#[utoipa::path(
    get,
    path = "/media/{id}/authors",
    tag = "media",
    params(("id" = i32, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Credited authors", body = Vec<Author>),
        (status = 404, description = "Media not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_media_authors(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.media.authors(id).await?;
    Ok(Json(authors))
}

/// Credit an author on a media item
#[utoipa::path(
    post,
    path = "/media/{id}/authors",
    tag = "media",
    params(("id" = i32, Path, description = "Media ID")),
    request_body = AddAuthorship,
    responses(
        (status = 201, description = "Author linked", body = Authorship),
        (status = 404, description = "Media or author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author already linked", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_media_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<AddAuthorship>,
) -> AppResult<(StatusCode, Json<Authorship>)> {
    let link = state.services.media.add_author(id, request.author_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Remove an author credit from a media item
#[utoipa::path(
    delete,
    path = "/media/{id}/authors/{author_id}",
    tag = "media",
    params(
        ("id" = i32, Path, description = "Media ID"),
        ("author_id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author unlinked"),
        (status = 404, description = "Author not linked to this media", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_media_author(
    State(state): State<AppState>,
    Path((id, author_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    state.services.media.remove_author(id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
