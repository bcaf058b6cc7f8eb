//! Runner error type and its `{error}` JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use voxrule_core::VoxruleError;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// Malformed body or a required field is absent.
    #[error("{0}")]
    BadRequest(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to start interpreter: {0}")]
    Spawn(String),

    #[error("Execution timed out after {0} seconds")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    pub fn status(&self) -> StatusCode {
        match self {
            RunnerError::BadRequest(_) | RunnerError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            }
            RunnerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RunnerError::Spawn(_) | RunnerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RunnerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<RunnerError> for VoxruleError {
    fn from(err: RunnerError) -> Self {
        VoxruleError::Runner(err.to_string())
    }
}
