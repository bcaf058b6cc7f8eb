//! Remote-code executor.
//!
//! Ships source code to an isolated process execution service and replies
//! with what the script printed.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use voxrule_core::RemoteCodeResponse;

use crate::error::ActionError;
use crate::types::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteLanguage {
    Python,
    Node,
}

impl fmt::Display for RemoteLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteLanguage::Python => write!(f, "python"),
            RemoteLanguage::Node => write!(f, "node"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: RemoteLanguage,
    code: &'a str,
    timeout: u64,
}

#[derive(Debug, Clone)]
pub struct RemoteCodeHandler {
    client: Client,
    default_timeout_secs: u64,
}

impl RemoteCodeHandler {
    pub fn new(client: Client, default_timeout_secs: u64) -> Self {
        Self {
            client,
            default_timeout_secs,
        }
    }

    pub async fn execute(
        &self,
        response: &RemoteCodeResponse,
        language: RemoteLanguage,
    ) -> Result<Outcome, ActionError> {
        if response.remote_url.is_empty() || response.remote_code.is_empty() {
            return Err(ActionError::Configuration(
                "remoteUrl and remoteCode are required".to_string(),
            ));
        }
        let timeout_secs = response.remote_timeout.unwrap_or(self.default_timeout_secs);
        let payload = ExecuteRequest {
            language,
            code: &response.remote_code,
            timeout: timeout_secs,
        };

        info!(%language, url = %response.remote_url, timeout_secs, "Submitting remote code");
        // Dropping the in-flight future on expiry aborts the request.
        let call = async {
            let resp = self
                .client
                .post(&response.remote_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| ActionError::Network(e.to_string()))?;
            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| ActionError::Network(e.to_string()))?;
            Ok::<_, ActionError>((status, body))
        };
        let (status, body) = tokio::time::timeout(Duration::from_secs(timeout_secs), call)
            .await
            .map_err(|_| ActionError::Timeout(timeout_secs))??;

        if !status.is_success() {
            return Err(ActionError::Network(format!(
                "remote execution failed: HTTP {}",
                status.as_u16()
            )));
        }

        let result: Value = serde_json::from_str(&body)
            .map_err(|e| ActionError::Parse(format!("invalid remote response: {}", e)))?;
        if let Some(error) = result.get("error").filter(|e| is_truthy(e)) {
            let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
            return Err(ActionError::Execution(format!(
                "remote execution error: {}",
                message
            )));
        }

        let text = ["output", "result"]
            .iter()
            .filter_map(|field| result.get(field))
            .find(|v| is_truthy(v))
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .unwrap_or_else(|| "execution complete".to_string());
        Ok(Outcome::Reply(text))
    }
}

/// Null, false, zero and the empty string count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
