use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::StoreError;

/// Message returned for every 500; internals stay in the logs.
pub const SERVER_ERROR_MESSAGE: &str = "An error occurred on the server";

/// AppError
///
/// The closed set of failures a request can end in. Handlers and extractors build one
/// of these at the point of detection; `IntoResponse` below is the only place that
/// turns them into HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    /// Request shape rejected by the validation layer before any handler logic ran.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Unexpected failure. The payload is internal detail and is never sent to the client.
    #[error("server error: {0}")]
    Server(String),
}

/// ErrorBody
///
/// The JSON shape of every error response: `{ "message": "..." }`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Authorization required".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// from_store
    ///
    /// Classifies a store failure for a handler. `subject` names the kind of record
    /// involved ("user", "card") and shapes the client-facing message.
    pub fn from_store(err: StoreError, subject: &str) -> Self {
        match err {
            StoreError::Duplicate if subject == "user" => {
                AppError::Conflict("A user with this email already exists".to_string())
            }
            StoreError::Duplicate => AppError::Conflict(format!("This {subject} already exists")),
            StoreError::Invalid(detail) => {
                tracing::debug!(%detail, "store rejected {subject} data");
                AppError::BadRequest(format!("Invalid data for {subject}"))
            }
            StoreError::Backend(detail) => AppError::Server(detail),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Server(detail) => {
                tracing::error!(error = %detail, "request failed");
                SERVER_ERROR_MESSAGE.to_string()
            }
            AppError::BadRequest(message)
            | AppError::Validation(message)
            | AppError::Unauthorized(message)
            | AppError::Forbidden(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => {
                tracing::debug!(status = status.as_u16(), %message, "request rejected");
                message
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Requested resource not found".to_string())
}
