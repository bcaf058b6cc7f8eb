//! Route handler functions for the admin API.
//!
//! Malformed bodies and ids are reported through [`ApiError`] so every
//! failure has the same `{error, message}` shape.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use voxrule_core::{Rule, RuleDraft, Settings};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleResponse {
    pub success: bool,
    pub rule: Rule,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
    pub revision: u64,
}

#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub rules: usize,
    pub revision: u64,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn rule_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid rule id: {}", e.body_text())))
}

// =============================================================================
// Rules
// =============================================================================

/// GET /api/rules
pub async fn list_rules(State(state): State<AppState>) -> Result<Json<Vec<Rule>>, ApiError> {
    Ok(Json(state.store.list()?))
}

/// POST /api/rules
pub async fn create_rule(
    State(state): State<AppState>,
    payload: Result<Json<RuleDraft>, JsonRejection>,
) -> Result<Json<RuleResponse>, ApiError> {
    let rule = state.store.create(body(payload)?)?;
    info!(rule_id = %rule.id, keyword = %rule.trigger.keyword, "Rule created via API");
    Ok(Json(RuleResponse {
        success: true,
        rule,
    }))
}

/// GET /api/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Rule>, ApiError> {
    Ok(Json(state.store.get(rule_id(path)?)?))
}

/// PUT /api/rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RuleDraft>, JsonRejection>,
) -> Result<Json<RuleResponse>, ApiError> {
    let id = rule_id(path)?;
    let rule = state.store.update(id, body(payload)?)?;
    info!(rule_id = %id, "Rule updated via API");
    Ok(Json(RuleResponse {
        success: true,
        rule,
    }))
}

/// DELETE /api/rules/{id}
pub async fn delete_rule(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = rule_id(path)?;
    state.store.delete(id)?;
    info!(rule_id = %id, "Rule deleted via API");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/rules/{id}/enabled
pub async fn set_rule_enabled(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<EnabledRequest>, JsonRejection>,
) -> Result<Json<RuleResponse>, ApiError> {
    let id = rule_id(path)?;
    let EnabledRequest { enabled } = body(payload)?;
    let rule = state.store.set_enabled(id, enabled)?;
    info!(rule_id = %id, enabled, "Rule toggled via API");
    Ok(Json(RuleResponse {
        success: true,
        rule,
    }))
}

// =============================================================================
// Settings and reload
// =============================================================================

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.settings())
}

/// POST /api/settings
pub async fn save_settings(
    State(state): State<AppState>,
    payload: Result<Json<Settings>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let settings = body(payload)?;
    state.store.save_settings(&settings)?;
    info!(
        keywords = settings.call_ai_keywords.len(),
        "Settings saved via API"
    );
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/reload - notify subscribers that the files may have changed
/// outside the API.
pub async fn reload(State(state): State<AppState>) -> Json<ReloadResponse> {
    let revision = state.store.reload();
    Json(ReloadResponse {
        success: true,
        message: "Configuration reloaded".to_string(),
        revision,
    })
}

// =============================================================================
// Health
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        rules: state.store.list().map(|r| r.len()).unwrap_or(0),
        revision: state.store.revision(),
    })
}
