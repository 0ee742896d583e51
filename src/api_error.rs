use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::engine::{BracketError, ScoreError};
use crate::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalServerError,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InternalServerError | ApiError::RepositoryError(_) => "internal",
            ApiError::InvalidInput(_) => "invalid-input",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::NotFound(_) => "not-found",
            ApiError::Conflict(_) => "conflict",
            ApiError::InsufficientData(_) => "insufficient-data",
        }
    }
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

impl From<BracketError> for ApiError {
    fn from(err: BracketError) -> Self {
        ApiError::InsufficientData(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    status: u16,
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            ApiError::InternalServerError | ApiError::RepositoryError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Repository failures stay in the logs; callers only see a generic message.
        let (message, details) = match self {
            ApiError::RepositoryError(e) => {
                tracing::error!(error = %e, "Repository failure while serving request");
                ("Storage error".to_string(), None)
            }
            _ => (self.to_string(), Some(self.to_string())),
        };

        let error_response = ErrorResponse {
            error: message,
            code: self.code(),
            status: status.as_u16(),
            details,
        };

        HttpResponse::build(status).json(error_response)
    }
}
