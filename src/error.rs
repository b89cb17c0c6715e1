use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level failure kinds. Handlers and services return these and the
/// HTTP layer maps them to status codes; transport failures from the mail
/// dispatcher never reach here (they are swallowed at the notification
/// boundary).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Permission(String),
    #[error("Invalid or missing credentials")]
    Unauthorized,
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Permission(_) => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            // Internal details stay in the logs, not the response body.
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error while handling request");
                "Internal server error".to_string()
            }
            ApiError::Internal => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": message
            })),
        )
            .into_response()
    }
}
