use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::routes::views::{found, login_redirect};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication required")]
    Unauthenticated {
        /// Path to return to after logging in.
        next: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(taxi_core::Error),
}

impl From<taxi_core::Error> for ServerError {
    fn from(err: taxi_core::Error) -> Self {
        match err {
            taxi_core::Error::NotFound { .. } => ServerError::NotFound(err.to_string()),
            taxi_core::Error::Invalid(errors) => ServerError::InvalidRequest(errors.to_string()),
            taxi_core::Error::Conflict { .. } => ServerError::Conflict(err.to_string()),
            other => ServerError::Store(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ServerError::Unauthenticated { next } => {
                return found(&login_redirect(next));
            }
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ServerError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", self.to_string())
            }
            ServerError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", self.to_string()),
            ServerError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", self.to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
