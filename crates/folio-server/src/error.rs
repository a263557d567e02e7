use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use folio_core::error::AppError;

use crate::dto::ErrorResponse;

/// Everything a handler or middleware can reject a request with.
///
/// Domain failures arrive via `From<AppError>` so handlers can use `?`;
/// auth rejections come from the bearer middleware directly.
pub enum ApiError {
    App(AppError),
    Unauthorized,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid or missing API key; send `Authorization: Bearer <key>`".to_string(),
            ),
            ApiError::App(err) => {
                let (status, error_type) = match err {
                    AppError::Generic(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                    AppError::SerializationError(_) => {
                        (StatusCode::BAD_REQUEST, "serialization_error")
                    }
                    AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                    AppError::ConfigError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
                    AppError::StorageError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
                    }
                    AppError::RateLimitExceeded => {
                        (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded")
                    }
                    AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                };
                (status, error_type, err.to_string())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}
