use serde_json::Value;

use crate::common::{generate_test_email, register_and_login, TestApp, TEST_PASSWORD};

async fn register(app: &TestApp, body: Value) -> reqwest::Response {
    app.api_client
        .post(app.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_register_returns_201_with_public_user() {
    let app = TestApp::new().await;
    let email = generate_test_email();

    let response = register(
        &app,
        serde_json::json!({"email": email, "password": TEST_PASSWORD, "name": "Ani"}),
    )
    .await;
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["id"].is_string());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_returns_409() {
    let app = TestApp::new().await;
    let email = generate_test_email();
    let body = serde_json::json!({"email": email, "password": TEST_PASSWORD, "name": "Ani"});

    assert_eq!(register(&app, body.clone()).await.status(), 201);

    let response = register(&app, body).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_register_rejects_admin_role_and_weak_password() {
    let app = TestApp::new().await;

    let response = register(
        &app,
        serde_json::json!({
            "email": generate_test_email(),
            "password": TEST_PASSWORD,
            "name": "Ani",
            "role": "admin"
        }),
    )
    .await;
    assert_eq!(response.status(), 400);

    let response = register(
        &app,
        serde_json::json!({"email": generate_test_email(), "password": "short", "name": "Ani"}),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["password"].is_string());
}

#[tokio::test]
async fn test_register_missing_field_returns_400() {
    let app = TestApp::new().await;

    let response = register(&app, serde_json::json!({"email": generate_test_email()})).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_login_sets_token_cookie() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let response = app
        .api_client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({"email": user.email, "password": TEST_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["id"], user.id.as_str());
}

#[tokio::test]
async fn test_login_wrong_password_returns_401() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let response = app
        .api_client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({"email": user.email, "password": "WrongPass999!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn test_check_without_token_is_unauthenticated() {
    let app = TestApp::new().await;

    let response = app.api_client.get(app.url("/api/auth/check")).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_check_with_garbage_token_is_invalid() {
    let app = TestApp::new().await;

    let response = app
        .api_client
        .get(app.url("/api/auth/check"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_cookie_session_then_logout() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    // Browser-style login stores the cookie in the jar
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({"email": user.email, "password": TEST_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app.client.get(app.url("/api/auth/check")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], user.email);

    let response = app.client.post(app.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let response = app.client.get(app.url("/api/auth/check")).send().await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_header_token_takes_priority_over_cookie() {
    let app = TestApp::new().await;
    let cookie_user = register_and_login(&app).await;
    let header_user = register_and_login(&app).await;

    app.client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({"email": cookie_user.email, "password": TEST_PASSWORD}))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .get(app.url("/api/auth/check"))
        .bearer_auth(&header_user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], header_user.id.as_str());

    let response = app.client.get(app.url("/api/auth/check")).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], cookie_user.id.as_str());
}
