use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::booking::BookingStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("dependency failed: {0}")]
    Dependency(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_transition(from: BookingStatus, to: BookingStatus) -> Self {
        AppError::InvalidTransition(format!("cannot move booking from {from} to {to}"))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Dependency(_) => "dependency",
            AppError::Persistence(_) => "persistence",
            AppError::Conflict(_) => "conflict",
            AppError::DataIntegrity(_) => "data_integrity",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidTransition(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Dependency(_) => (
                StatusCode::BAD_GATEWAY,
                "a required service is unavailable, please retry".to_string(),
            ),
            AppError::Persistence(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "the change could not be saved, please retry".to_string(),
            ),
            AppError::DataIntegrity(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
