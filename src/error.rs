//! Service error types with HTTP status code mapping.
//!
//! [`WorkflowError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::llm::LlmError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "task not found: 5d3c...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`WorkflowError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status                      |
/// |-----------|------------|----------------------------------|
/// | 1000–1999 | Validation | 400 Bad Request                  |
/// | 2000–2999 | Not Found  | 404 Not Found                    |
/// | 3000–3999 | Server     | 500 Internal Server Error        |
/// | 5000–5999 | LLM        | 500 / 502 Bad Gateway            |
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Message with the given ID was not found.
    #[error("message not found: {0}")]
    MessageNotFound(uuid::Uuid),

    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(uuid::Uuid),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// The LLM call itself failed.
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// The LLM answered with something the workflow cannot use.
    #[error("unexpected llm output: {0}")]
    UnexpectedLlmOutput(String),
}

impl WorkflowError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MessageNotFound(_) => 2001,
            Self::TaskNotFound(_) => 2002,
            Self::PersistenceError(_) => 3001,
            Self::Llm(_) => 5001,
            Self::UnexpectedLlmOutput(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MessageNotFound(_) | Self::TaskNotFound(_) => StatusCode::NOT_FOUND,
            Self::PersistenceError(_) | Self::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnexpectedLlmOutput(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
