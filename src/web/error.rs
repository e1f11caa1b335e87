//! JSON error responses for API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

/// Machine-readable error codes returned in the `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    NotFound,
    InvalidTime,
    DatabaseUnavailable,
    InternalError,
}

impl ApiErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidTime => StatusCode::BAD_REQUEST,
            ApiErrorCode::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_time(field: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidTime,
            format!("Invalid {field} '{value}'. Expected HH:MM or HH:MM:SS"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Log a database failure and hide its details from the client.
pub fn db_error(context: &str, e: anyhow::Error) -> ApiError {
    error!(error = ?e, "{context} failed");
    ApiError::new(
        ApiErrorCode::InternalError,
        format!("{context} failed"),
    )
}

pub trait OptionNotFoundExt<T> {
    fn or_not_found(self, what: &str, id: &str) -> Result<T, ApiError>;
}

impl<T> OptionNotFoundExt<T> for Option<T> {
    fn or_not_found(self, what: &str, id: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::new(ApiErrorCode::NotFound, format!("{what} '{id}' not found")))
    }
}
