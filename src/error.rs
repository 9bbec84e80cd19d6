//! Application error type and its HTTP mapping.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Field name -> list of human readable messages, the shape of a 400 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NOT_PERMITTED_PAGE: &str = "You are not allowed to see this page";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found.")]
    NotFound,

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Invalid authentication credentials.")]
    Unauthorized,

    #[error("{}", .0.as_deref().unwrap_or(PERMISSION_DENIED))]
    Forbidden(Option<String>),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("JSON parse error - {0}")]
    ParseError(String),

    #[error("invalid submitted data")]
    Validation(FieldErrors),

    #[error("plugin type {0} declares no data serializer")]
    MissingDataSerializer(String),

    #[error("stored data of plugin type {0} does not decode")]
    UndecodablePluginData(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound | AppError::InvalidPage => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::ParseError(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingDataSerializer(_)
            | AppError::UndecodablePluginData(_)
            | AppError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => json!(errors),
            AppError::MissingDataSerializer(plugin_type) => {
                tracing::error!(plugin_type = %plugin_type, "plugin type is misconfigured: no data serializer");
                json!({ "detail": "A server error occurred." })
            }
            AppError::UndecodablePluginData(plugin_type) => {
                tracing::error!(plugin_type = %plugin_type, "stored plugin data does not match its type");
                json!({ "detail": "A server error occurred." })
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                json!({ "detail": "A server error occurred." })
            }
            _ => json!({ "detail": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
