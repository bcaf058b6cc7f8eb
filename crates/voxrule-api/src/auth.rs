//! Bearer token authentication for the admin API.
//!
//! The token lives in a file under the data directory, created on first run
//! with owner-only permissions.

use std::path::Path;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use crate::error::ApiError;
use crate::state::AppState;

/// Random 32-character hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Read the token at `path`, or create one there if the file is missing or
/// blank. Fails only if a new token cannot be written.
pub fn load_or_generate_token(path: &Path) -> std::io::Result<String> {
    if let Ok(contents) = std::fs::read_to_string(path) {
        let token = contents.trim();
        if !token.is_empty() {
            tracing::info!("API token loaded from {}", path.display());
            return Ok(token.to_string());
        }
    }

    let token = generate_token();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &token)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    tracing::info!("API token generated at {}", path.display());
    Ok(token)
}

fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
    let value = value.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected a Bearer token".to_string()))
}

/// Constant-time comparison so response timing does not leak a prefix.
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Rejects requests without `Authorization: Bearer <token>` matching
/// [`AppState::api_token`] with 401.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let verdict = bearer(req.headers()).map(|token| tokens_match(token, &state.api_token));
    match verdict {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!(path = %req.uri().path(), "Rejected request with invalid token");
            ApiError::Unauthorized("Invalid bearer token".to_string()).into_response()
        }
        Err(err) => err.into_response(),
    }
}
