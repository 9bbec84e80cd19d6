use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{MethodFilter, MethodRouter, get, on},
};

/// Plugins Router Module
///
/// Plugin retrieval and the `submit_data` action.
pub fn plugin_routes() -> Router<AppState> {
    Router::new()
        // GET /plugins/{id}/
        // Body shape follows the serializer registered for the plugin's type.
        .route("/plugins/{id}", get(handlers::retrieve_plugin))
        .route("/plugins/{id}/", get(handlers::retrieve_plugin))
        // POST /plugins/{id}/submit_data/
        // PUT and PATCH are routed too, so the handler can refuse them explicitly.
        .route("/plugins/{id}/submit_data", submit_data_route())
        .route("/plugins/{id}/submit_data/", submit_data_route())
}

fn submit_data_route() -> MethodRouter<AppState> {
    on(
        MethodFilter::POST
            .or(MethodFilter::PUT)
            .or(MethodFilter::PATCH),
        handlers::submit_data,
    )
}
