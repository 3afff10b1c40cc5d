//! API handlers for Biblio REST endpoints

pub mod authors;
pub mod health;
pub mod libraries;
pub mod loans;
pub mod media;
pub mod openapi;
pub mod penalties;
pub mod search;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use validator::Validate;

use crate::{error::AppError, AppState};

/// JSON body extractor that also runs `validator` rules.
///
/// Malformed bodies and rule violations are both reported as 400 with the
/// usual error body.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string extractor that also runs `validator` rules
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/loans", get(users::get_user_loans))
        .route("/users/:id/penalties", get(users::get_user_penalties))
        // Libraries
        .route(
            "/libraries",
            get(libraries::list_libraries).post(libraries::create_library),
        )
        .route(
            "/libraries/:id",
            get(libraries::get_library)
                .put(libraries::update_library)
                .delete(libraries::delete_library),
        )
        .route("/libraries/:id/media", get(libraries::list_library_media))
        // Media
        .route("/media", get(media::list_media).post(media::create_media))
        .route(
            "/media/:id",
            get(media::get_media)
                .put(media::update_media)
                .delete(media::delete_media),
        )
        .route(
            "/media/:id/authors",
            get(media::list_media_authors).post(media::add_media_author),
        )
        .route(
            "/media/:id/authors/:author_id",
            axum::routing::delete(media::remove_media_author),
        )
        .route("/books", get(media::list_books))
        .route("/magazines", get(media::list_magazines))
        .route("/dvds", get(media::list_dvds))
        .route("/articles", get(media::list_articles))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        .route("/authors/:id/works", get(authors::list_author_works))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/overdue", get(loans::list_overdue_loans))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/renew", post(loans::renew_loan))
        // Penalties
        .route(
            "/penalties",
            get(penalties::list_penalties).post(penalties::create_penalty),
        )
        .route(
            "/penalties/:id",
            get(penalties::get_penalty)
                .put(penalties::update_penalty)
                .delete(penalties::delete_penalty),
        )
        // Search
        .route("/search", get(search::search))
        // Statistics
        .route("/stats", get(stats::get_summary))
        .route("/stats/media", get(stats::get_media_by_kind))
        .route("/stats/loans", get(stats::get_loans_by_status))
        .route("/stats/loans/monthly", get(stats::get_monthly_loans))
        .route("/stats/libraries", get(stats::get_media_per_library))
        .route("/stats/top-media", get(stats::get_top_media))
        .route("/stats/top-users", get(stats::get_top_users))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
