//! Library management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        library::{CreateLibrary, Library, LibraryQuery, UpdateLibrary},
        media::{CatalogQuery, Media},
        pagination::PaginatedResponse,
    },
    AppState,
};

use super::{ValidatedJson, ValidatedQuery};

/// List libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    params(LibraryQuery),
    responses(
        (status = 200, description = "List of libraries", body = PaginatedResponse<Library>),
        (status = 400, description = "Invalid pagination", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<LibraryQuery>,
) -> AppResult<Json<PaginatedResponse<Library>>> {
    let libraries = state.services.libraries.list(&query).await?;
    Ok(Json(libraries))
}

/// Get library by ID
#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library details", body = Library),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_library(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Library>> {
    let library = state.services.libraries.get_by_id(id).await?;
    Ok(Json(library))
}

/// Create a library
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = Library),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    ValidatedJson(library): ValidatedJson<CreateLibrary>,
) -> AppResult<(StatusCode, Json<Library>)> {
    let created = state.services.libraries.create(library).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a library
#[utoipa::path(
    put,
    path = "/libraries/{id}",
    tag = "libraries",
    params(("id" = i32, Path, description = "Library ID")),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = Library),
        (status = 400, description = "Invalid or empty patch", body = crate::error::ErrorResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(patch): ValidatedJson<UpdateLibrary>,
) -> AppResult<Json<Library>> {
    let updated = state.services.libraries.update(id, patch).await?;
    Ok(Json(updated))
}

/// Delete a library
#[utoipa::path(
    delete,
    path = "/libraries/{id}",
    tag = "libraries",
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Library still owns media", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_library(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    state.services.libraries.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List media owned by a library
#[utoipa::path(
    get,
    path = "/libraries/{id}/media",
    tag = "libraries",
    params(("id" = i32, Path, description = "Library ID"), CatalogQuery),
    responses(
        (status = 200, description = "Media owned by the library", body = PaginatedResponse<Media>),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_library_media(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedQuery(query): ValidatedQuery<CatalogQuery>,
) -> AppResult<Json<PaginatedResponse<Media>>> {
    let media = state.services.libraries.media(id, &query).await?;
    Ok(Json(media))
}
