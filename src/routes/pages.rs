use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// Read-only page endpoints. Both routes filter with the requester's page scope:
/// public requesters only reach published pages of the current site, staff also
/// reach drafts.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /pages/?page=N
        // Light representation, 50 per page.
        .route("/pages", get(handlers::list_pages))
        .route("/pages/", get(handlers::list_pages))
        // GET /pages/{id}/
        // Full representation including the page's placeholders.
        .route("/pages/{id}", get(handlers::retrieve_page))
        .route("/pages/{id}/", get(handlers::retrieve_page))
}
