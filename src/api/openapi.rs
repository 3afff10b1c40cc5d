//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, health, libraries, loans, media, penalties, search, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "1.0.0",
        description = "Library lending REST API: catalog, borrowers, loans and fines"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::get_user_loans,
        users::get_user_penalties,
        // Libraries
        libraries::list_libraries,
        libraries::get_library,
        libraries::create_library,
        libraries::update_library,
        libraries::delete_library,
        libraries::list_library_media,
        // Media
        media::list_media,
        media::list_books,
        media::list_magazines,
        media::list_dvds,
        media::list_articles,
        media::get_media,
        media::create_media,
        media::update_media,
        media::delete_media,
        media::list_media_authors,
        media::add_media_author,
        media::remove_media_author,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        authors::list_author_works,
        // Loans
        loans::list_loans,
        loans::list_overdue_loans,
        loans::get_loan,
        loans::create_loan,
        loans::return_loan,
        loans::renew_loan,
        // Penalties
        penalties::list_penalties,
        penalties::get_penalty,
        penalties::create_penalty,
        penalties::update_penalty,
        penalties::delete_penalty,
        // Search
        search::search,
        // Stats
        stats::get_summary,
        stats::get_media_by_kind,
        stats::get_loans_by_status,
        stats::get_monthly_loans,
        stats::get_media_per_library,
        stats::get_top_media,
        stats::get_top_users,
    ),
    components(
        schemas(
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Libraries
            crate::models::library::Library,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            // Media
            crate::models::media::MediaKind,
            crate::models::media::Media,
            crate::models::media::BookDetails,
            crate::models::media::MagazineDetails,
            crate::models::media::DvdDetails,
            crate::models::media::ArticleDetails,
            crate::models::media::CreateMedia,
            crate::models::media::UpdateMedia,
            crate::models::media::BookPatch,
            crate::models::media::MagazinePatch,
            crate::models::media::DvdPatch,
            crate::models::media::ArticlePatch,
            // Authors
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::author::Authorship,
            crate::models::author::AddAuthorship,
            // Loans
            crate::models::loan::LoanStatus,
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            crate::models::loan::ReturnLoan,
            crate::models::loan::RenewLoan,
            crate::models::loan::ReturnOutcome,
            // Penalties
            crate::models::penalty::Penalty,
            crate::models::penalty::CreatePenalty,
            crate::models::penalty::UpdatePenalty,
            // Search
            search::SearchResults,
            // Stats
            stats::StatsSummary,
            stats::StatEntry,
            stats::LibraryMediaCount,
            stats::MonthlyCount,
            stats::TopMedia,
            stats::TopUser,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Borrower management"),
        (name = "libraries", description = "Library branches"),
        (name = "media", description = "Catalog of books, magazines, DVDs and articles"),
        (name = "authors", description = "Authors and their credits"),
        (name = "loans", description = "Lending, returns and renewals"),
        (name = "penalties", description = "Fines and lending bans"),
        (name = "search", description = "Global search"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_lending_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/loans"));
        assert!(paths.contains_key("/loans/{id}/return"));
        assert!(paths.contains_key("/media/{id}/authors/{author_id}"));
        assert!(paths.contains_key("/stats/top-users"));
    }

    #[test]
    fn renewal_rejection_is_documented() {
        use utoipa::openapi::{PathItemType, RefOr};

        let doc = ApiDoc::openapi();
        let renew = &doc.paths.paths["/loans/{id}/renew"].operations[&PathItemType::Post];

        match &renew.responses.responses["400"] {
            RefOr::T(response) => {
                assert_eq!(response.description, "New date precedes the borrow date")
            }
            RefOr::Ref(_) => panic!("expected an inline response"),
        }
    }
}
