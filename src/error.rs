// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Failure of the durable store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

/// Errors raised by the exam lifecycle and question lookups.
#[derive(Debug, thiserror::Error)]
pub enum ExamError {
    /// Unknown exam token or question id.
    #[error("{0} not found")]
    NotFound(String),

    /// The exam belongs to another user.
    #[error("access denied")]
    Forbidden,

    #[error("exam already completed")]
    AlreadyCompleted,

    /// The time budget ran out.
    #[error("exam time expired")]
    Expired,

    #[error("not enough {question_type} questions: requested {requested}, found {available}")]
    QuestionSourceExhausted {
        question_type: String,
        requested: usize,
        available: usize,
    },

    #[error(transparent)]
    Upstream(#[from] StoreError),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username, exam already completed)
    Conflict(String),

    // 410 Gone (exam time budget exceeded)
    Gone(String),

    // 429 Too Many Requests (account locked)
    TooManyRequests(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        let msg = err.to_string();
        match err {
            ExamError::NotFound(_) => AppError::NotFound(msg),
            ExamError::Forbidden => AppError::Forbidden(msg),
            ExamError::AlreadyCompleted => AppError::Conflict(msg),
            ExamError::Expired => AppError::Gone(msg),
            ExamError::QuestionSourceExhausted { .. } => AppError::Conflict(msg),
            ExamError::Upstream(_) => AppError::InternalServerError(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
