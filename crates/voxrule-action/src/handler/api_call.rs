//! API-call executor.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{info, warn};

use voxrule_core::{ApiCallResponse, ApiResponseType, HttpMethod};

use crate::error::ActionError;
use crate::types::Outcome;

/// Fields tried in order when no response path is configured.
const PRIORITY_FIELDS: [&str; 5] = ["message", "text", "content", "data", "result"];

#[derive(Debug, Clone)]
pub struct ApiCallHandler {
    client: Client,
    timeout: Duration,
}

impl ApiCallHandler {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn execute(&self, response: &ApiCallResponse) -> Result<Outcome, ActionError> {
        if response.api_url.is_empty() {
            return Err(ActionError::Configuration("apiUrl is required".to_string()));
        }
        let headers = build_headers(response)?;

        let mut request = self
            .client
            .request(to_method(response.api_method), &response.api_url)
            .headers(headers)
            .timeout(self.timeout);
        if response.api_method.sends_body() {
            if let Some(body) = response.api_body.as_deref().filter(|b| !b.is_empty()) {
                request = request.body(body.to_string());
            }
        }

        info!(method = %response.api_method, url = %response.api_url, "Calling API");
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ActionError::Timeout(self.timeout.as_secs())
            } else {
                ActionError::Network(e.to_string())
            }
        })?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ActionError::Network(format!(
                "API call failed: HTTP {} {}",
                status.as_u16(),
                body
            )));
        }

        Ok(Outcome::Reply(parse_api_response(
            &body,
            response.api_response_type,
            response.api_response_path.as_deref(),
            response.api_response_fallback.as_deref(),
        )))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

/// Rule headers layered over a default JSON content type.
fn build_headers(response: &ApiCallResponse) -> Result<HeaderMap, ActionError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &response.api_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ActionError::Configuration(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ActionError::Configuration(format!("invalid value for header {}: {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Turn a successful response body into reply text.
pub fn parse_api_response(
    raw: &str,
    response_type: ApiResponseType,
    path: Option<&str>,
    fallback: Option<&str>,
) -> String {
    if response_type == ApiResponseType::Text {
        return raw.to_string();
    }

    let json: Value = match serde_json::from_str(raw) {
        Ok(json) => json,
        Err(e) => {
            if response_type == ApiResponseType::Json {
                warn!(error = %e, "API response is not valid JSON");
                return fallback.unwrap_or(raw).to_string();
            }
            return raw.to_string();
        }
    };

    if let Some(path) = path.filter(|p| !p.is_empty()) {
        return match extract_json_path(&json, path) {
            Some(value) => stringify(value),
            None => {
                warn!(path, "API response path not found");
                fallback
                    .map(str::to_string)
                    .unwrap_or_else(|| pretty(&json))
            }
        };
    }

    PRIORITY_FIELDS
        .iter()
        .filter_map(|field| json.get(field))
        .find(|v| !v.is_null())
        .map(stringify)
        .unwrap_or_else(|| pretty(&json))
}

/// Follow a dot-separated path through objects and arrays. Numeric segments
/// index arrays. A `null` at the end counts as missing.
pub fn extract_json_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => pretty(value),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
