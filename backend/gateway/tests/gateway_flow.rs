//! End-to-end tests for the gateway router against a mock upstream.
//!
//! Requests are driven through the axum router with `oneshot`; the upstream
//! financial API is a wiremock server.

use std::collections::HashMap;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fingate_config::env::{
    ENV_API_KEY, ENV_CLIENT_ID, ENV_CLIENT_ORIGIN, ENV_CLIENT_VERSION, ENV_SIGNING_SECRET,
    ENV_UPSTREAM_BASE_URL, ENV_UPSTREAM_TIMEOUT_SECS,
};
use fingate_config::load_from_map;
use fingate_core::UpstreamMethod;
use fingate_gateway::signing::compute_signature;
use fingate_gateway::{build_router, GatewayState};

// =============================================================================
// Test Helpers
// =============================================================================

const SIGNIN: &str = "/client/v2/auth/signin";
const CLIENT_IP: &str = "203.0.113.7";

fn env_for(upstream: &str, overrides: &[(&str, &str)]) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = [
        (ENV_UPSTREAM_BASE_URL, upstream),
        (ENV_API_KEY, "key-123"),
        (ENV_CLIENT_ID, "web-client"),
        (ENV_CLIENT_VERSION, "2.4.0"),
        (ENV_CLIENT_ORIGIN, "https://app.example.test"),
        (ENV_SIGNING_SECRET, "s3cret"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    env
}

fn app_with(upstream: &str, overrides: &[(&str, &str)]) -> Router {
    let config = load_from_map(&env_for(upstream, overrides)).unwrap();
    build_router(GatewayState::from_config(&config).unwrap())
}

fn app(upstream: &str) -> Router {
    app_with(upstream, &[])
}

fn post_gateway(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/gateway")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_gateway(endpoint: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/gateway?endpoint={endpoint}"))
        .header("x-forwarded-for", CLIENT_IP)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

fn assert_defensive_headers(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
}

// =============================================================================
// Sign-in and Session Tests
// =============================================================================

#[tokio::test]
async fn test_signin_success_sets_session_cookie() {
    let server = MockServer::start().await;
    let upstream_body = json!({ "status": "success", "data": { "token": { "token": "abc123" } } });

    Mock::given(method("POST"))
        .and(path(SIGNIN))
        .and(header_eq("x-api-key", "key-123"))
        .and(header_eq("x-client-id", "web-client"))
        .and(header_eq("x-client-version", "2.4.0"))
        .and(header_eq("x-client-device", "web"))
        .and(header_eq("origin", "https://app.example.test"))
        .and(body_json(json!({ "email": "a@b.c", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(post_gateway(json!({
            "endpoint": SIGNIN,
            "data": { "email": "a@b.c", "password": "pw" }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_defensive_headers(&response);
    assert!(response.headers().contains_key("x-request-id"));

    let cookie = set_cookie(&response).expect("session cookie");
    assert!(cookie.starts_with("token=abc123;"), "{cookie}");
    for attr in ["HttpOnly", "Secure", "SameSite=Lax", "Path=/", "Max-Age=86400"] {
        assert!(cookie.contains(attr), "missing {attr} in {cookie}");
    }

    assert_eq!(json_body(response).await, upstream_body);
}

#[tokio::test]
async fn test_failed_signin_relays_error_without_cookie() {
    let server = MockServer::start().await;
    let upstream_body = json!({ "status": "error", "message": "Invalid credentials" });

    Mock::given(method("POST"))
        .and(path(SIGNIN))
        .respond_with(ResponseTemplate::new(401).set_body_json(upstream_body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(post_gateway(json!({ "endpoint": SIGNIN, "data": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
    assert_eq!(json_body(response).await, upstream_body);
}

#[tokio::test]
async fn test_signin_success_without_token_is_internal_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SIGNIN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "data": {} })),
        )
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(post_gateway(json!({ "endpoint": SIGNIN, "data": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookie(&response).is_none());
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_token_on_other_endpoint_sets_no_cookie() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/client/v2/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "status": "success", "data": { "token": { "token": "abc123" } } }),
        ))
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(post_gateway(json!({ "endpoint": "/client/v2/auth/verify-otp", "data": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let response = app("http://127.0.0.1:9")
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gateway/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(json_body(response).await, json!({ "status": "success" }));
}

// =============================================================================
// Allow-list and Validation Tests
// =============================================================================

#[tokio::test]
async fn test_disallowed_endpoint_never_reaches_upstream() {
    let server = MockServer::start().await;

    Mock::given(path("/admin/delete-everything"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(&server.uri());
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_gateway(json!({ "endpoint": "/admin/delete-everything", "data": {} })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_defensive_headers(&response);
        assert_eq!(json_body(response).await, json!({ "error": "Endpoint not allowed" }));
    }
}

#[tokio::test]
async fn test_missing_endpoint_is_bad_request() {
    let app = app("http://127.0.0.1:9");

    let response = app
        .clone()
        .oneshot(post_gateway(json!({ "data": { "x": 1 } })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid endpoint" }));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/gateway")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_endpoint_is_bad_request() {
    let app = app("http://127.0.0.1:9");

    let response = app
        .clone()
        .oneshot(post_gateway(json!({ "endpoint": "", "data": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid endpoint" }));

    let response = app.oneshot(get_gateway("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid endpoint" }));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let response = app("http://127.0.0.1:9")
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gateway")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({ "error": "Invalid request body" }));
}

// =============================================================================
// Forwarding Tests
// =============================================================================

#[tokio::test]
async fn test_get_forwards_query_and_signs_full_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/v2/transfers"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(get_gateway("/client/v2/transfers%3Fpage%3D2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "items": [] }));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let sent = &received[0].headers;
    let timestamp = sent.get("x-client-timestamp").unwrap().to_str().unwrap();
    assert!(timestamp.parse::<i64>().is_ok());

    let expected = compute_signature(
        b"s3cret",
        "web-client",
        timestamp,
        UpstreamMethod::Get,
        "/client/v2/transfers?page=2",
    )
    .unwrap();
    assert_eq!(sent.get("x-request-signature").unwrap(), expected.as_str());
    assert!(sent.get("authorization").is_none());
}

#[tokio::test]
async fn test_session_cookie_is_forwarded_as_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/v2/wallet"))
        .and(header_eq("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "balance": 10 })))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/gateway?endpoint=/client/v2/wallet")
        .header(header::COOKIE, "theme=dark; token=abc123")
        .body(Body::empty())
        .unwrap();

    let response = app(&server.uri()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upstream_error_status_is_relayed() {
    let server = MockServer::start().await;
    let upstream_body = json!({ "status": "error", "message": "Loan not found" });

    Mock::given(method("GET"))
        .and(path("/client/v2/loans/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(upstream_body.clone()))
        .mount(&server)
        .await;

    let response = app(&server.uri())
        .oneshot(get_gateway("/client/v2/loans/42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_defensive_headers(&response);
    assert_eq!(json_body(response).await, upstream_body);
}

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/client/v2/wallet"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let response = app_with(&server.uri(), &[(ENV_UPSTREAM_TIMEOUT_SECS, "1")])
        .oneshot(get_gateway("/client/v2/wallet"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await, json!({ "error": "Upstream unavailable" }));
}

#[tokio::test]
async fn test_unreachable_upstream_is_internal_error() {
    // Nothing listens on the discard port, so the connect is refused.
    let response = app("http://127.0.0.1:9")
        .oneshot(get_gateway("/client/v2/wallet"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_defensive_headers(&response);
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_unresolvable_upstream_host_is_internal_error() {
    let response = app("http://no-such-host.invalid")
        .oneshot(get_gateway("/client/v2/wallet"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "error": "Internal server error" }));
}

// =============================================================================
// Rate Limiting Tests
// =============================================================================

#[tokio::test]
async fn test_101st_request_in_window_is_rate_limited() {
    let app = app("http://127.0.0.1:9");
    let request = || post_gateway(json!({ "endpoint": "/admin/delete-everything" }));

    // Rejected calls still consume quota.
    for _ in 0..100 {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert_eq!(json_body(response).await, json!({ "error": "Too many requests" }));

    // Another client has its own window.
    let other = Request::builder()
        .method("GET")
        .uri("/gateway?endpoint=/admin")
        .header("x-forwarded-for", "198.51.100.1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(other).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Health Tests
// =============================================================================

#[tokio::test]
async fn test_health_reports_ok() {
    let response = app("http://127.0.0.1:9")
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "fingate");
    assert!(body["uptimeSeconds"].is_u64());
}
