/// Error types for notification-service
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    /// Push or email delivery failed; never surfaced by fan-out
    #[error("Delivery failed: {0}")]
    Transport(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(msg) if msg.starts_with("Notification") => {
                error_codes::NOTIFICATION_NOT_FOUND
            }
            AppError::NotFound(msg) if msg.starts_with("User") || msg.starts_with("Admin") => {
                error_codes::USER_NOT_FOUND
            }
            AppError::NotFound(_) => error_codes::RESOURCE_NOT_FOUND,
            AppError::Conflict(_) => error_codes::USER_ALREADY_EXISTS,
            AppError::Validation(_) => error_codes::VALIDATION_ERROR,
            AppError::Transport(_) => error_codes::DELIVERY_FAILED,
            AppError::Persistence(_) => error_codes::DATABASE_ERROR,
            AppError::Unauthorized(_) => error_codes::MISSING_IDENTITY,
            AppError::Forbidden(_) => error_codes::ADMIN_REQUIRED,
            AppError::Internal(_) => error_codes::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => kinds::NOT_FOUND_ERROR,
            AppError::Conflict(_) => kinds::CONFLICT_ERROR,
            AppError::Validation(_) => kinds::VALIDATION_ERROR,
            AppError::Unauthorized(_) => kinds::AUTHENTICATION_ERROR,
            AppError::Forbidden(_) => kinds::AUTHORIZATION_ERROR,
            AppError::Transport(_) => kinds::SERVICE_UNAVAILABLE_ERROR,
            AppError::Persistence(_) | AppError::Internal(_) => kinds::SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::Persistence(_) | AppError::Internal(_) | AppError::Transport(_) => {
                tracing::error!(error = %self, "request failed");
                status
                    .canonical_reason()
                    .unwrap_or("Internal Server Error")
                    .to_string()
            }
            other => other.to_string(),
        };

        let response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &message,
            status.as_u16(),
            self.kind(),
            self.code(),
        );

        HttpResponse::build(status).json(response)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
