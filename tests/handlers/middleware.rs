use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tutor_attendance::StoreClients;

use crate::common::{FailingStore, TestApp, TestAppOptions};

fn failing_stores() -> StoreClients {
    StoreClients {
        admin: Arc::new(FailingStore),
        anon: Arc::new(FailingStore),
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_after_budget() {
    let app = TestApp::new_with_options(TestAppOptions::rate_limited(3)).await;

    for remaining in (0..3).rev() {
        let response = app.api_client.get(app.url("/api/tutors")).send().await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["ratelimit-limit"], "3");
        assert_eq!(response.headers()["ratelimit-remaining"], remaining.to_string().as_str());
        assert!(response.headers().contains_key("ratelimit-reset"));
    }

    let response = app.api_client.get(app.url("/api/tutors")).send().await.unwrap();
    assert_eq!(response.status(), 429);
    assert!(response.headers().contains_key("retry-after"));
    let text = response.text().await.unwrap();
    assert_eq!(text, "Too many requests from this IP, please try again later.");

    // Only /api is limited
    let response = app.api_client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_preflight_from_allowed_origin_is_204() {
    let app = TestApp::new().await;

    let response = app
        .api_client
        .request(Method::OPTIONS, app.url("/api/attendance"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type,authorization")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("PATCH"));
}

#[tokio::test]
async fn test_disallowed_origin_gets_no_allow_origin() {
    let app = TestApp::new().await;

    let response = app
        .api_client
        .get(app.url("/api/tutors"))
        .header("Origin", "https://evil.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(!response.headers().contains_key("access-control-allow-origin"));

    let response = app
        .api_client
        .get(app.url("/api/tutors"))
        .header("Origin", "https://tutor-app.sigmath.net")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://tutor-app.sigmath.net"
    );
}

// ============================================================================
// Fallbacks and failures
// ============================================================================

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = TestApp::new().await;

    let response = app.api_client.get(app.url("/api/nope")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "Endpoint not found"}));
}

#[tokio::test]
async fn test_store_failure_in_development_exposes_detail() {
    let app =
        TestApp::new_with_options(TestAppOptions::with_stores("development", failing_stores())).await;

    let response = app.api_client.get(app.url("/api/tutors")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UPSTREAM_FAILURE");
    assert!(body["message"].as_str().unwrap().contains("store unreachable"));
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn test_store_failure_in_production_hides_detail() {
    let app =
        TestApp::new_with_options(TestAppOptions::with_stores("production", failing_stores())).await;

    let response = app.api_client.get(app.url("/api/stats")).send().await.unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Something went wrong");
    assert!(body.get("stack").is_none());
    assert!(!body.to_string().contains("store unreachable"));
}
