//! Integration tests for the HTTP surface.
//!
//! The router is driven in-process with `oneshot`, and a wiremock server
//! stands in for the OpenAI-compatible upstream, so no network access or API
//! keys are needed.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatrelay::config::{Config, MockConfig, OpenAiCompatConfig};
use chatrelay::gateway::{routes::build_routes, GatewayState, RelayEvent};
use chatrelay::models::ModelRegistry;
use chatrelay::providers::{mock_reply, ChatMessage, ProviderRegistry};

// ============================================================================
// Test Helpers
// ============================================================================

fn base_config() -> Config {
    Config {
        mock: MockConfig {
            char_delay: Duration::ZERO,
        },
        ..Config::default()
    }
}

fn config_with_upstream(base_url: &str) -> Config {
    Config {
        openai_compat: Some(OpenAiCompatConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            idle_timeout: None,
        }),
        ..base_config()
    }
}

fn app(config: &Config) -> Router {
    let state = GatewayState::from_config(config).unwrap();
    build_routes(state, &config.server.cors_origins)
}

/// Build an OpenAI-style SSE body from content fragments.
fn upstream_body(chunks: &[&str]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({ "choices": [{ "index": 0, "delta": { "content": chunk } }] })
        ));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_upstream(server: &MockServer, status: u16, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header_eq("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// POST a chat request and return the raw SSE body.
async fn chat_raw(app: Router, body: Value) -> (StatusCode, Option<String>, String) {
    let resp = app
        .oneshot(
            Request::post("/api/chat/stream")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Split an SSE body into `(event, data)` pairs.
fn parse_events(raw: &str) -> Vec<(String, Value)> {
    raw.split("\n\n")
        .filter(|frame| !frame.is_empty())
        .map(|frame| {
            let mut lines = frame.lines();
            let event = lines
                .next()
                .and_then(|l| l.strip_prefix("event: "))
                .expect("event line");
            let data = lines
                .next()
                .and_then(|l| l.strip_prefix("data: "))
                .expect("data line");
            assert!(lines.next().is_none(), "unexpected extra line in {frame:?}");
            (event.to_string(), serde_json::from_str(data).unwrap())
        })
        .collect()
}

fn names(events: &[(String, Value)]) -> Vec<&str> {
    events.iter().map(|(name, _)| name.as_str()).collect()
}

fn delta_texts(events: &[(String, Value)]) -> Vec<String> {
    events
        .iter()
        .filter(|(name, _)| name == "delta")
        .map(|(_, data)| data["text"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health & Models
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = get_json(app(&base_config()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn models_without_pass_through() {
    let (status, body) = get_json(app(&base_config()), "/api/models").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{
            "id": "mock-1",
            "name": "Mock Stream",
            "provider": "mock",
            "description": "Local simulated streaming output"
        }])
    );
}

#[tokio::test]
async fn models_with_pass_through() {
    let config = config_with_upstream("http://127.0.0.1:9");
    let (_, body) = get_json(app(&config), "/api/models").await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["mock-1", "gpt-4o", "gpt-5", "deepseek-chat", "qwen-max"]);
}

// ============================================================================
// Chat Stream: Mock
// ============================================================================

#[tokio::test]
async fn unknown_model_streams_mock_reply() {
    let (status, content_type, raw) = chat_raw(
        app(&base_config()),
        json!({
            "model": "does-not-exist",
            "messages": [
                { "role": "user", "content": "first" },
                { "role": "assistant", "content": "ok" },
                { "role": "user", "content": "你好" }
            ],
            "stream": true
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/event-stream"));

    let events = parse_events(&raw);
    assert_eq!(events[0], ("meta".to_string(), json!({ "model": "mock-1", "provider": "mock" })));
    assert_eq!(events.last().unwrap(), &("done".to_string(), json!({})));
    assert_eq!(names(&events).iter().filter(|n| **n == "done").count(), 1);
    assert!(!names(&events).contains(&"error"));

    let expected = mock_reply("mock-1", &[ChatMessage::user("你好")]);
    assert_eq!(delta_texts(&events).concat(), expected);
    assert_eq!(delta_texts(&events).len(), expected.chars().count());
}

#[tokio::test]
async fn wire_format_is_exact() {
    let (_, _, raw) = chat_raw(
        app(&base_config()),
        json!({ "model": "mock-1", "messages": [] }),
    )
    .await;

    let reply = mock_reply("mock-1", &[]);
    let mut expected = String::from("event: meta\ndata: {\"model\":\"mock-1\",\"provider\":\"mock\"}\n\n");
    for ch in reply.chars() {
        expected.push_str(&RelayEvent::delta(ch.to_string()).encode());
    }
    expected.push_str("event: done\ndata: {}\n\n");
    assert_eq!(raw, expected);
}

#[tokio::test]
async fn invalid_role_is_rejected_before_streaming() {
    let (status, _, _) = chat_raw(
        app(&base_config()),
        json!({ "model": "mock-1", "messages": [{ "role": "tool", "content": "x" }] }),
    )
    .await;
    assert!(status.is_client_error());
}

// ============================================================================
// Chat Stream: Pass-through
// ============================================================================

#[tokio::test]
async fn pass_through_relays_upstream_chunks() {
    let upstream = MockServer::start().await;
    mount_upstream(&upstream, 200, upstream_body(&["Hi", "!"])).await;

    let (status, _, raw) = chat_raw(
        app(&config_with_upstream(&upstream.uri())),
        json!({ "model": "gpt-4o", "messages": [{ "role": "user", "content": "hello" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = parse_events(&raw);
    assert_eq!(names(&events), vec!["meta", "delta", "delta", "done"]);
    assert_eq!(events[0].1, json!({ "model": "gpt-4o", "provider": "openai_compat" }));
    assert_eq!(delta_texts(&events), vec!["Hi", "!"]);

    let requests = upstream.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent,
        json!({
            "model": "gpt-4o",
            "messages": [{ "role": "user", "content": "hello" }],
            "stream": true
        })
    );
}

#[tokio::test]
async fn malformed_upstream_lines_are_skipped() {
    let upstream = MockServer::start().await;
    let body = format!(
        "data: not-json\n\n: comment\n\n{}",
        upstream_body(&["still", " here"])
    );
    mount_upstream(&upstream, 200, body).await;

    let (_, _, raw) = chat_raw(
        app(&config_with_upstream(&upstream.uri())),
        json!({ "model": "qwen-max", "messages": [] }),
    )
    .await;

    let events = parse_events(&raw);
    assert_eq!(names(&events), vec!["meta", "delta", "delta", "done"]);
    assert_eq!(delta_texts(&events), vec!["still", " here"]);
}

#[tokio::test]
async fn upstream_failure_is_reported_in_band() {
    let upstream = MockServer::start().await;
    mount_upstream(&upstream, 500, "overloaded".to_string()).await;

    let (status, _, raw) = chat_raw(
        app(&config_with_upstream(&upstream.uri())),
        json!({ "model": "gpt-5", "messages": [{ "role": "user", "content": "hi" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = parse_events(&raw);
    assert_eq!(names(&events), vec!["meta", "error", "done"]);
    assert_eq!(
        events[1].1,
        json!({ "message": "Upstream error (500 Internal Server Error): overloaded" })
    );
}

#[tokio::test]
async fn unconfigured_pass_through_model_reports_error() {
    // Registry lists pass-through models but no pass-through instance exists.
    let config = base_config();
    let state = GatewayState {
        models: Arc::new(ModelRegistry::new(true)),
        providers: Arc::new(ProviderRegistry::from_config(&config).unwrap()),
        version: "test".to_string(),
    };
    let app = build_routes(state, &[]);

    let (status, _, raw) = chat_raw(app, json!({ "model": "gpt-4o", "messages": [] })).await;

    assert_eq!(status, StatusCode::OK);
    let events = parse_events(&raw);
    assert_eq!(
        events,
        vec![
            ("meta".to_string(), json!({ "model": "gpt-4o", "provider": "openai_compat" })),
            ("error".to_string(), json!({ "message": "Provider not available: openai_compat" })),
            ("done".to_string(), json!({})),
        ]
    );
}

#[tokio::test]
async fn unconfigured_pass_through_hides_its_models() {
    // Without pass-through config, naming one of its models routes to mock.
    let (_, _, raw) = chat_raw(
        app(&base_config()),
        json!({ "model": "gpt-4o", "messages": [] }),
    )
    .await;
    let events = parse_events(&raw);
    assert_eq!(events[0].1, json!({ "model": "mock-1", "provider": "mock" }));
    assert!(!names(&events).contains(&"error"));
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn cors_allows_configured_origin() {
    let resp = app(&base_config())
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let resp = app(&base_config())
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://evil.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn wildcard_origin_is_ignored_by_the_router() {
    let mut config = base_config();
    config.server.cors_origins = vec!["*".to_string(), "http://localhost:5173".to_string()];

    let resp = app(&config)
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://other.test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let resp = app(&config)
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
