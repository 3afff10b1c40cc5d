//! Penalty endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        pagination::PaginatedResponse,
        penalty::{CreatePenalty, Penalty, PenaltyQuery, UpdatePenalty},
    },
    AppState,
};

use super::{ValidatedJson, ValidatedQuery};

/// List penalties
#[utoipa::path(
    get,
    path = "/penalties",
    tag = "penalties",
    params(PenaltyQuery),
    responses(
        (status = 200, description = "List of penalties", body = PaginatedResponse<Penalty>),
        (status = 400, description = "Invalid filter or pagination", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_penalties(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PenaltyQuery>,
) -> AppResult<Json<PaginatedResponse<Penalty>>> {
    let penalties = state.services.penalties.list(&query).await?;
    Ok(Json(penalties))
}

/// Get penalty by ID
#[utoipa::path(
    get,
    path = "/penalties/{id}",
    tag = "penalties",
    params(("id" = i32, Path, description = "Penalty ID")),
    responses(
        (status = 200, description = "Penalty details", body = Penalty),
        (status = 404, description = "Penalty not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_penalty(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Penalty>> {
    let penalty = state.services.penalties.get_by_id(id).await?;
    Ok(Json(penalty))
}

/// Record a penalty manually
#[utoipa::path(
    post,
    path = "/penalties",
    tag = "penalties",
    request_body = CreatePenalty,
    responses(
        (status = 201, description = "Penalty created", body = Penalty),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "User or loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_penalty(
    State(state): State<AppState>,
    ValidatedJson(penalty): ValidatedJson<CreatePenalty>,
) -> AppResult<(StatusCode, Json<Penalty>)> {
    let created = state.services.penalties.create(penalty).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a penalty
#[utoipa::path(
    put,
    path = "/penalties/{id}",
    tag = "penalties",
    params(("id" = i32, Path, description = "Penalty ID")),
    request_body = UpdatePenalty,
    responses(
        (status = 200, description = "Penalty updated", body = Penalty),
        (status = 400, description = "Invalid or empty patch", body = crate::error::ErrorResponse),
        (status = 404, description = "Penalty not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_penalty(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ValidatedJson(patch): ValidatedJson<UpdatePenalty>,
) -> AppResult<Json<Penalty>> {
    let updated = state.services.penalties.update(id, patch).await?;
    Ok(Json(updated))
}

/// Delete a penalty
#[utoipa::path(
    delete,
    path = "/penalties/{id}",
    tag = "penalties",
    params(("id" = i32, Path, description = "Penalty ID")),
    responses(
        (status = 204, description = "Penalty deleted"),
        (status = 404, description = "Penalty not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_penalty(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    state.services.penalties.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
