use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Placeholders Router Module
///
/// Retrieve only; there is no placeholder listing.
pub fn placeholder_routes() -> Router<AppState> {
    Router::new()
        // GET /placeholders/{id}/
        // 403 when the owning page is missing or not visible to the requester.
        .route("/placeholders/{id}", get(handlers::retrieve_placeholder))
        .route("/placeholders/{id}/", get(handlers::retrieve_placeholder))
}
