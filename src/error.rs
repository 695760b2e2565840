use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy shared by every API handler. Each variant maps to exactly
/// one HTTP status and is rendered as a JSON `{"error": "..."}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    /// Catch-all for persistence and parse failures. The public message is a
    /// fixed per-operation string; the underlying cause is only logged.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn internal(message: &'static str, source: anyhow::Error) -> Self {
        error!(error = %source, "{message}");
        ApiError::Internal(message)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthRequired | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
