use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{models::ErrorResponse, repository::RepositoryError};

/// ApiError
///
/// Every failure a handler can surface. Each variant maps to exactly one status code
/// and is rendered through the same `{"error": "..."}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Store failures. The cause is logged, never returned to the caller.
    #[error("something went wrong")]
    Internal(#[from] RepositoryError),
}

impl ApiError {
    pub fn post_not_found() -> Self {
        ApiError::NotFound("Post not found".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            tracing::error!(error = ?cause, "store operation failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (self.status_code(), body).into_response()
    }
}
