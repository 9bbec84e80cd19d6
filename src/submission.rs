//! The `submit_data` action on a single plugin instance.

use axum::http::Method;
use serde_json::Value;

use crate::{
    AppState,
    auth::Requester,
    error::{AppError, AppResult},
    handlers::fetch_visible_plugin,
};

pub const UPDATES_NOT_ALLOWED: &str = "PUT and PATCH are not allowed for now";

/// submit_data
///
/// Parses and validates `body` with the plugin type's data serializer, then hands the
/// data to the type's processing hook, or stores it as a submission when there is none.
///
/// Only `POST` is accepted; `PUT` and `PATCH` are rejected before anything is read.
/// The body is parsed only once the plugin has passed the visibility gate and its
/// permission checks.
pub async fn submit_data(
    state: &AppState,
    requester: &Requester,
    plugin_id: i64,
    body: &[u8],
    method: &Method,
) -> AppResult<Value> {
    if *method == Method::PUT || *method == Method::PATCH {
        return Err(AppError::MethodNotAllowed(UPDATES_NOT_ALLOWED.to_string()));
    }
    if *method != Method::POST {
        return Err(AppError::MethodNotAllowed(format!("Method \"{method}\" not allowed.")));
    }

    let plugin = fetch_visible_plugin(state, requester, plugin_id).await?;

    // A plugin type reachable here without a data serializer is a deployment bug,
    // not something the client can fix.
    let Some((registration, data_serializer)) = state
        .plugins
        .get(plugin.plugin_type())
        .and_then(|r| r.data_serializer.as_ref().map(|serializer| (r, serializer)))
    else {
        return Err(AppError::MissingDataSerializer(plugin.plugin_type().to_string()));
    };

    // Registered type, but the stored payload never decoded into its variant.
    if plugin.content.concrete_type().is_none() {
        return Err(AppError::UndecodablePluginData(plugin.plugin_type().to_string()));
    }

    if let Some(check) = registration.failed_permission(requester, &plugin) {
        tracing::debug!(plugin_id, check, "denied: plugin permission check failed");
        return Err(AppError::Forbidden(None));
    }

    let payload = parse_json_body(body)?;
    let data = data_serializer
        .validate(&payload, &plugin)
        .map_err(AppError::Validation)?;

    match &registration.hook {
        Some(hook) => {
            hook.process(state.repo.as_ref(), requester, &plugin, data)
                .await
        }
        None => {
            let submission = state
                .repo
                .save_submission(plugin.id(), data, requester.user_id())
                .await?;
            tracing::info!(plugin_id, submission_id = submission.id, "plugin data saved");
            Ok(submission.data)
        }
    }
}

/// An empty body stands for `{}`, so validation reports the missing fields.
fn parse_json_body(body: &[u8]) -> AppResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| AppError::ParseError(e.to_string()))
}
