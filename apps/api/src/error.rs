use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use fusion_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ErrorResponse {
    fn message(error: String) -> Self {
        Self {
            error,
            reason: None,
            retry_after: None,
        }
    }
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::message(message)),
            )
                .into_response(),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::message(message))).into_response()
            }
            AppError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse::message(message))).into_response()
            }
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::message(message)),
            )
                .into_response(),
            AppError::SecurityBlocked { reason, .. } => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Request blocked for security reasons".to_owned(),
                    reason: Some(reason),
                    retry_after: None,
                }),
            )
                .into_response(),
            AppError::RateLimited {
                retry_after_seconds,
            } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse {
                        error: "Too many requests".to_owned(),
                        reason: None,
                        retry_after: Some(retry_after_seconds),
                    }),
                )
                    .into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            AppError::Internal(message) => {
                tracing::error!(%message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::message("internal error".to_owned())),
                )
                    .into_response()
            }
        }
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
