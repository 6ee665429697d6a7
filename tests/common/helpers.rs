//! Shared test helper functions

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use tutor_attendance::{
    store::{Query, Store},
    Error, Result,
};

use crate::common::TestApp;

pub const TEST_PASSWORD: &str = "SecurePass123!";

/// A registered and logged-in user
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// Generates a unique test email using nanosecond timestamp
pub fn generate_test_email() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let random: u32 = rand::random();
    format!("test_{}_{}@example.com", timestamp, random)
}

/// Registers a tutor and logs in with the cookie-less client
pub async fn register_and_login(app: &TestApp) -> TestUser {
    let email = generate_test_email();

    let register_response = app
        .api_client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": "Test Tutor",
            "role": "tutor"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(register_response.status(), 201);

    let login_response = app
        .api_client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({
            "email": email,
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(login_response.status(), 200);

    let body: Value = login_response.json().await.unwrap();
    TestUser {
        id: body["user"]["id"].as_str().unwrap().to_string(),
        email,
        token: body["token"].as_str().unwrap().to_string(),
    }
}

/// A valid attendance submission body
pub fn attendance_body(tutor: &str, student: &str, date: &str) -> Value {
    serde_json::json!({
        "tutor_name": tutor,
        "tutoring_date": date,
        "tutoring_time": "10:00",
        "student_name": student
    })
}

/// Submits a record and returns the shaped response
pub async fn submit_attendance(app: &TestApp, user: &TestUser, body: &Value) -> Value {
    let response = app
        .api_client
        .post(app.url("/api/attendance"))
        .bearer_auth(&user.token)
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    response.json().await.unwrap()
}

/// Table store whose every call fails like an unreachable platform
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn select(&self, _query: &Query) -> Result<Vec<Value>> {
        Err(Error::Upstream("store unreachable: connection refused".to_string()))
    }

    async fn count(&self, _query: &Query) -> Result<u64> {
        Err(Error::Upstream("store unreachable: connection refused".to_string()))
    }

    async fn insert(&self, _table: &str, _row: Value) -> Result<Value> {
        Err(Error::Upstream("store unreachable: connection refused".to_string()))
    }

    async fn update(&self, _query: &Query, _patch: Value) -> Result<Vec<Value>> {
        Err(Error::Upstream("store unreachable: connection refused".to_string()))
    }

    async fn delete(&self, _query: &Query) -> Result<Vec<Value>> {
        Err(Error::Upstream("store unreachable: connection refused".to_string()))
    }
}
