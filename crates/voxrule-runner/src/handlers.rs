//! `POST /execute` and `GET /health`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RunnerError;
use crate::runner::{ExecutionOutput, ScriptLanguage};
use crate::state::RunnerState;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub language: Option<String>,
    pub code: Option<String>,
    /// Seconds. Absent or zero falls back to the configured default.
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub exit_code: i32,
}

impl From<ExecutionOutput> for ExecuteResponse {
    fn from(out: ExecutionOutput) -> Self {
        Self {
            success: true,
            output: out.output,
            error: out.error,
            exit_code: out.exit_code,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime_secs: u64,
}

/// POST /execute - run a script and report its output.
///
/// A script that exits non-zero is still a 200; the exit code and stderr
/// are in the body.
pub async fn execute(
    State(state): State<RunnerState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, RunnerError> {
    let Json(req) = body.map_err(|e| RunnerError::BadRequest(e.body_text()))?;

    let (language, code) = match (req.language, req.code) {
        (Some(language), Some(code)) if !language.is_empty() && !code.is_empty() => {
            (language, code)
        }
        _ => {
            return Err(RunnerError::BadRequest(
                "language and code are required".to_string(),
            ))
        }
    };
    let lang = ScriptLanguage::parse(&language)
        .ok_or_else(|| RunnerError::UnsupportedLanguage(language.clone()))?;
    let timeout_secs = req
        .timeout
        .filter(|t| *t > 0)
        .unwrap_or_else(|| state.runner.default_timeout_secs());

    let output = state.runner.run(lang, &code, timeout_secs).await?;
    info!(
        %language,
        exit_code = output.exit_code,
        stdout_bytes = output.output.len(),
        stderr_bytes = output.error.len(),
        "Script finished"
    );
    Ok(Json(output.into()))
}

/// GET /health
pub async fn health(State(state): State<RunnerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
