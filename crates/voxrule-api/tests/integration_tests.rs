//! Integration tests for the admin API.
//!
//! Each test gets its own temp data directory and drives the router with
//! `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use voxrule_api::handlers::{HealthResponse, ReloadResponse, RuleResponse};
use voxrule_api::{create_router, AppState};
use voxrule_core::{Rule, Settings};
use voxrule_storage::RuleStore;

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

struct Harness {
    _dir: TempDir,
    store: Arc<RuleStore>,
    app: axum::Router,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        RuleStore::open(
            &dir.path().join("custom-rules.json"),
            &dir.path().join("custom-settings.json"),
        )
        .unwrap(),
    );
    let app = create_router(AppState::new(store.clone(), TEST_TOKEN.to_string(), 3000));
    Harness {
        _dir: dir,
        store,
        app,
    }
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn text_rule(trigger_type: &str, keyword: &str, text: &str) -> Value {
    json!({
        "trigger": {"type": trigger_type, "keyword": keyword},
        "response": {"type": "text", "text": text}
    })
}

async fn create(app: &axum::Router, draft: Value) -> Rule {
    let (status, body) = send(app, authed("POST", "/api/rules", Some(draft))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let created: RuleResponse = serde_json::from_value(body).unwrap();
    assert!(created.success);
    created.rule
}

// =============================================================================
// Public endpoints and auth
// =============================================================================

#[tokio::test]
async fn test_health_without_auth() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_value(body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.rules, 0);
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        Request::get("/api/rules").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_token_is_401() {
    let h = harness();
    let req = Request::get("/api/rules")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid bearer token");
}

// =============================================================================
// Rules CRUD
// =============================================================================

#[tokio::test]
async fn test_rule_lifecycle() {
    let h = harness();

    let (status, body) = send(&h.app, authed("GET", "/api/rules", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let rule = create(&h.app, text_rule("startsWith", "open light", "OK")).await;
    assert!(rule.enabled);
    assert!(rule.updated_at.is_none());

    let (status, body) = send(&h.app, authed("GET", &format!("/api/rules/{}", rule.id), None)).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Rule = serde_json::from_value(body).unwrap();
    assert_eq!(fetched, rule);

    let (status, body) = send(
        &h.app,
        authed(
            "PUT",
            &format!("/api/rules/{}", rule.id),
            Some(text_rule("startsWith", "open light", "Done")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["rule"]["id"], rule.id.to_string());
    assert_eq!(body["rule"]["response"]["text"], "Done");
    assert!(body["rule"]["updatedAt"].is_number());

    let (status, body) = send(
        &h.app,
        authed(
            "POST",
            &format!("/api/rules/{}/enabled", rule.id),
            Some(json!({"enabled": false})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rule"]["enabled"], false);
    assert!(h.store.enabled_rules().unwrap().is_empty());

    let (status, body) =
        send(&h.app, authed("DELETE", &format!("/api/rules/{}", rule.id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(h.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_written_rules_are_visible_to_the_store() {
    let h = harness();
    let rule = create(&h.app, text_rule("exact", "hi", "hello")).await;
    let stored = h.store.get(rule.id).unwrap();
    assert_eq!(stored.trigger.keyword, "hi");
}

#[tokio::test]
async fn test_duplicate_trigger_is_409() {
    let h = harness();
    create(&h.app, text_rule("contains", "weather", "sunny")).await;
    let (status, body) = send(
        &h.app,
        authed("POST", "/api/rules", Some(text_rule("contains", "weather", "rainy"))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(h.store.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_into_existing_trigger_is_409() {
    let h = harness();
    create(&h.app, text_rule("exact", "a", "1")).await;
    let second = create(&h.app, text_rule("exact", "b", "2")).await;
    let (status, _) = send(
        &h.app,
        authed(
            "PUT",
            &format!("/api/rules/{}", second.id),
            Some(text_rule("exact", "a", "2")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_drafts_are_400() {
    let h = harness();

    let (status, body) = send(
        &h.app,
        authed("POST", "/api/rules", Some(text_rule("exact", "", "x"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let unknown_kind = json!({
        "trigger": {"type": "exact", "keyword": "x"},
        "response": {"type": "teleport"}
    });
    let (status, _) = send(&h.app, authed("POST", "/api/rules", Some(unknown_kind))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &h.app,
        authed("POST", "/api/rules", Some(json!({"trigger": "nope"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        authed("GET", &format!("/api/rules/{}", uuid::Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = send(&h.app, authed("DELETE", "/api/rules/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid rule id"));
}

// =============================================================================
// Settings and reload
// =============================================================================

#[tokio::test]
async fn test_settings_round_trip() {
    let h = harness();
    let (status, body) = send(&h.app, authed("GET", "/api/settings", None)).await;
    assert_eq!(status, StatusCode::OK);
    let defaults: Settings = serde_json::from_value(body).unwrap();
    assert_eq!(defaults, Settings::default());

    let (status, _) = send(
        &h.app,
        authed(
            "POST",
            "/api/settings",
            Some(json!({"callAIKeywords": ["hey"], "historyMaxLength": 4})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let saved = h.store.settings();
    assert_eq!(saved.call_ai_keywords, vec!["hey".to_string()]);
    assert_eq!(saved.history_max_length, 4);
}

#[tokio::test]
async fn test_reload_bumps_revision() {
    let h = harness();
    let before = h.store.revision();
    let mut watcher = h.store.subscribe();

    let (status, body) = send(&h.app, authed("POST", "/api/reload", None)).await;
    assert_eq!(status, StatusCode::OK);
    let reload: ReloadResponse = serde_json::from_value(body).unwrap();
    assert!(reload.success);
    assert!(reload.revision > before);
    assert!(watcher.has_changed().unwrap());
}
