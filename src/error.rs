//! Error taxonomy for the webhook receiver core and its HTTP surface.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Errors that can surface from the store, the admission path, or the HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("event not found")]
    NotFound,

    #[error("queue full, retry later")]
    QueueFull,

    #[error("service not ready")]
    NotReady,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("invalid request: {0}")]
    Validation(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::QueueFull => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
