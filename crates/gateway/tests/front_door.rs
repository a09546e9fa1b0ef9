//! # Integration Tests: HTTP Front Door
//!
//! Router di-drive langsung lewat `tower::ServiceExt::oneshot`, tanpa socket.
//! Mode live memakai wiremock sebagai node upstream.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use oak_ops_gateway::paths;
use oak_ops_gateway::{
    router, AppState, GatewayConfig, GatewayMetrics, GatewayMode, SnapshotResolver, UpstreamCache,
    UpstreamClient,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ════════════════════════════════════════════════════════════════════════════
// HELPERS
// ════════════════════════════════════════════════════════════════════════════

fn app(mode: GatewayMode, upstream_base: &str) -> Router {
    let config = GatewayConfig {
        mode,
        cluster_id: "oak-test-b".to_string(),
        upstream_base: upstream_base.to_string(),
        ..GatewayConfig::default()
    };
    let upstream = UpstreamClient::new(
        &config.upstream_base,
        Duration::from_secs(2),
        Arc::new(UpstreamCache::default()),
        Arc::new(GatewayMetrics::new()),
    )
    .unwrap();
    let resolver = SnapshotResolver::new(upstream, config.chain_mode.clone());
    router(AppState::new(config, resolver))
}

fn static_app() -> Router {
    app(GatewayMode::Static, "http://127.0.0.1:9")
}

async fn call(app: Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ════════════════════════════════════════════════════════════════════════════
// FRONT DOOR RULES
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let response = call(static_app(), Method::GET, "/ops/v1/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = body_json(response).await;
    assert_eq!(body["version"], "v1");
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Endpoint not found");
    assert_eq!(body["error"]["retryable"], false);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() {
    let response = call(static_app(), Method::POST, "/ops/v1/overview").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
    assert_eq!(body["error"]["retryable"], false);
}

#[tokio::test]
async fn test_options_preflight_is_empty_204() {
    let response = call(static_app(), Method::OPTIONS, "/ops/v1/overview").await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET,OPTIONS");
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

// ════════════════════════════════════════════════════════════════════════════
// STATIC MODE
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_static_mode_serves_envelope() {
    let response = call(static_app(), Method::GET, "/ops/v1/overview").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type,authorization");

    let body = body_json(response).await;
    assert_eq!(body["version"], "v1");
    assert_eq!(body["clusterId"], "oak-test-b");
    assert!(body["generatedAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["leader"]["term"], 42);
}

#[tokio::test]
async fn test_static_mode_every_route_answers() {
    let routes = [
        "/ops/v1/overview",
        "/ops/v1/header",
        "/ops/v1/cluster",
        "/ops/v1/raft",
        "/ops/v1/replication",
        "/ops/v1/queue",
        "/ops/v1/proposals",
        "/ops/v1/durability",
        "/ops/v1/health",
        "/ops/v1/events/recent",
        "/ops/v1/events/stats",
        "/ops/v1/finality",
        "/ops/v1/tarmk",
        "/ops/v1/tar-chain",
        "/ops/v1/transactions/summary",
        "/ops/v1/transactions/tx-1",
    ];
    let app = static_app();
    for route in routes {
        let response = call(app.clone(), Method::GET, route).await;
        assert_eq!(response.status(), StatusCode::OK, "{route}");
        let body = body_json(response).await;
        assert!(body["data"].is_object(), "{route}");
    }
}

#[tokio::test]
async fn test_static_events_limit_is_clamped() {
    let app = static_app();

    let body = body_json(call(app.clone(), Method::GET, "/ops/v1/events/recent?limit=3").await).await;
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 3);

    let body = body_json(call(app.clone(), Method::GET, "/ops/v1/events/recent?limit=500").await).await;
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 50);

    let body = body_json(call(app, Method::GET, "/ops/v1/events/recent").await).await;
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_static_transaction_routes() {
    let app = static_app();

    let body = body_json(call(app.clone(), Method::GET, "/ops/v1/transactions/summary").await).await;
    assert_eq!(body["data"]["states"]["COMMITTED"], 1201);

    let body = body_json(call(app, Method::GET, "/ops/v1/transactions/tx-77").await).await;
    assert_eq!(body["data"]["transactionId"], "tx-77");
}

#[tokio::test]
async fn test_transaction_id_is_taken_raw() {
    let app = static_app();

    let response = call(app.clone(), Method::GET, "/ops/v1/transactions/%FF").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    let body = body_json(response).await;
    assert_eq!(body["version"], "v1");
    assert_eq!(body["data"]["transactionId"], "%FF");

    let body = body_json(call(app.clone(), Method::GET, "/ops/v1/transactions/a/b").await).await;
    assert_eq!(body["data"]["transactionId"], "a/b");

    let response = call(app, Method::POST, "/ops/v1/transactions/%FF").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ════════════════════════════════════════════════════════════════════════════
// LIVE MODE
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_live_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(paths::RAFT_METRICS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = call(app(GatewayMode::Live, &server.uri()), Method::GET, "/ops/v1/raft").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(body["error"]["retryable"], true);
    assert_eq!(body["error"]["message"], "upstream /v1/aeron/raft-metrics HTTP 500");
}

#[tokio::test]
async fn test_live_raft_projection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(paths::RAFT_METRICS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentTerm": 42,
            "commitIndex": 12502,
            "electionCount": 1,
        })))
        .mount(&server)
        .await;

    let response = call(app(GatewayMode::Live, &server.uri()), Method::GET, "/ops/v1/raft").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["clusterId"], "oak-test-b");
    assert_eq!(body["data"]["term"], 42);
    assert_eq!(body["data"]["commitIndex"], 12502);
}

#[tokio::test]
async fn test_live_events_limit_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/events/recent"))
        .and(wiremock::matchers::query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{ "id": "e1", "type": "LEADERSHIP_CHANGE", "severity": "warn" }]
        })))
        .mount(&server)
        .await;

    let response = call(
        app(GatewayMode::Live, &server.uri()),
        Method::GET,
        "/ops/v1/events/recent?limit=999",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["events"][0]["id"], "e1");
}

// ════════════════════════════════════════════════════════════════════════════
// METRICS
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let app = static_app();
    let _ = call(app.clone(), Method::GET, "/ops/v1/overview").await;
    let _ = call(app.clone(), Method::GET, "/nope").await;

    let response = call(app, Method::GET, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("ops_gateway_requests_total 2"));
    assert!(text.contains("ops_gateway_requests_by_status{status=\"200\"} 1"));
    assert!(text.contains("ops_gateway_requests_by_status{status=\"404\"} 1"));
}
