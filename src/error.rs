use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use uuid::Uuid;

/// Crate-wide error taxonomy. One enum, one mapping to HTTP at the transport
/// boundary (see `IntoResponse` below) — no throwing for control flow.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Invalid(Vec<FieldError>),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("downstream unavailable: {0}")]
    Unavailable(String),

    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid(vec![FieldError::new(field, message)])
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "retryAfter")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "correlationId")]
    correlation_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message: "validation failed".to_string(),
                    errors: Some(errors),
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    message: "missing or invalid credentials".to_string(),
                    errors: None,
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    message,
                    errors: None,
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    message,
                    errors: None,
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    message,
                    errors: None,
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    message: "too many requests".to_string(),
                    errors: None,
                    retry_after: Some(retry_after_secs),
                    correlation_id: None,
                },
            ),
            AppError::Unavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    message,
                    errors: None,
                    retry_after: None,
                    correlation_id: None,
                },
            ),
            AppError::Internal(err) => {
                let correlation_id = Uuid::new_v4().to_string();
                tracing::error!(correlation_id = %correlation_id, error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: "an unexpected error occurred".to_string(),
                        errors: None,
                        retry_after: None,
                        correlation_id: Some(correlation_id),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Unavailable(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_err: jsonwebtoken::errors::Error) -> Self {
        AppError::Unauthenticated
    }
}
