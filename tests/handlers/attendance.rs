use chrono::DateTime;
use serde_json::Value;

use crate::common::{attendance_body, register_and_login, submit_attendance, TestApp};

// ============================================================================
// Submission
// ============================================================================

#[tokio::test]
async fn test_submit_sets_owner_and_jakarta_timestamp() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let record = submit_attendance(&app, &user, &attendance_body("A", "B", "2024-01-01")).await;

    assert_eq!(record["created_by"], user.id.as_str());
    assert_eq!(record["tutor_name"], "A");
    assert_eq!(record["student_name"], "B");
    assert_eq!(record["tutoring_time"], "10:00");
    assert!(record["timestamp"].as_str().unwrap().ends_with("+07:00"));
    assert!(record["updated_at"].is_null());
    assert_eq!(record.as_object().unwrap().len(), 10);
}

#[tokio::test]
async fn test_submit_requires_principal() {
    let app = TestApp::new().await;

    let response = app
        .api_client
        .post(app.url("/api/attendance"))
        .json(&attendance_body("A", "B", "2024-01-01"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_submit_missing_field_writes_nothing() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let response = app
        .api_client
        .post(app.url("/api/attendance"))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({
            "tutor_name": "A",
            "tutoring_date": "2024-01-01",
            "tutoring_time": "10:00",
            "student_name": "  "
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELD");

    let response = app
        .api_client
        .get(app.url("/api/attendance"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_submit_rejects_unknown_field_and_bad_date() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let mut body = attendance_body("A", "B", "2024-01-01");
    body["record_id"] = Value::String("forged".to_string());
    let response = app
        .api_client
        .post(app.url("/api/attendance"))
        .bearer_auth(&user.token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_PARAMETER");

    let response = app
        .api_client
        .post(app.url("/api/attendance"))
        .bearer_auth(&user.token)
        .json(&attendance_body("A", "B", "01/02/2024"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_second_page_of_25_records() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    for i in 1..=25 {
        submit_attendance(&app, &user, &attendance_body("A", &format!("S{}", i), "2024-01-01")).await;
    }

    let response = app
        .api_client
        .get(app.url("/api/attendance?page=2&limit=10"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["pagination"],
        serde_json::json!({"page": 2, "limit": 10, "total": 25, "totalPages": 3})
    );

    let names: Vec<&str> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["student_name"].as_str().unwrap())
        .collect();
    let expected: Vec<String> = (6..=15).rev().map(|i| format!("S{}", i)).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_list_filters_by_tutor_and_rejects_zero_page() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    submit_attendance(&app, &user, &attendance_body("Ani", "X", "2024-01-01")).await;
    submit_attendance(&app, &user, &attendance_body("Budi", "Y", "2024-01-02")).await;

    let response = app
        .api_client
        .get(app.url("/api/attendance?tutor_name=Ani"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["records"][0]["tutor_name"], "Ani");

    let response = app
        .api_client
        .get(app.url("/api/attendance?page=0"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = app
        .api_client
        .get(app.url("/api/attendance?page=9223372036854775807&limit=10"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_PARAMETER");

    let response = app
        .api_client
        .get(app.url("/api/attendance?page=abc"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["pagination"]["page"], 1);
}

// ============================================================================
// Single record, update, delete
// ============================================================================

#[tokio::test]
async fn test_get_record_found_missing_and_malformed() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;
    let record = submit_attendance(&app, &user, &attendance_body("A", "B", "2024-01-01")).await;
    let id = record["record_id"].as_str().unwrap();

    let response = app
        .api_client
        .get(app.url(&format!("/api/records/{}", id)))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, record);

    let response = app
        .api_client
        .get(app.url("/api/records/0190f5a0-0000-7000-8000-000000000099"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Record not found");

    let response = app
        .api_client
        .get(app.url("/api/records/not-a-uuid"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");

    let response = app
        .api_client
        .delete(app.url("/api/attendance/not-a-uuid"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_partial_update_keeps_untouched_fields() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let mut body = attendance_body("A", "B", "2024-01-01");
    body["email"] = Value::String("a@example.com".to_string());
    let original = submit_attendance(&app, &user, &body).await;
    let url = app.url(&format!("/api/attendance/{}", original["record_id"].as_str().unwrap()));

    let response = app
        .api_client
        .patch(&url)
        .bearer_auth(&user.token)
        .json(&serde_json::json!({"student_name": "C", "email": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let first: Value = response.json().await.unwrap();

    assert_eq!(first["student_name"], "C");
    assert!(first["email"].is_null());
    for field in ["record_id", "timestamp", "tutor_name", "tutoring_date", "tutoring_time", "created_by"] {
        assert_eq!(first[field], original[field], "{} changed", field);
    }

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let response = app
        .api_client
        .patch(&url)
        .bearer_auth(&user.token)
        .json(&serde_json::json!({"tutoring_time": "11:30:00"}))
        .send()
        .await
        .unwrap();
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["student_name"], "C");
    assert_eq!(second["tutoring_time"], "11:30:00");

    let first_stamp = DateTime::parse_from_rfc3339(first["updated_at"].as_str().unwrap()).unwrap();
    let second_stamp = DateTime::parse_from_rfc3339(second["updated_at"].as_str().unwrap()).unwrap();
    assert!(second_stamp > first_stamp);
}

#[tokio::test]
async fn test_update_rejects_null_required_field_and_missing_record() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;
    let record = submit_attendance(&app, &user, &attendance_body("A", "B", "2024-01-01")).await;

    let response = app
        .api_client
        .patch(app.url(&format!("/api/attendance/{}", record["record_id"].as_str().unwrap())))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({"tutor_name": null}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = app
        .api_client
        .patch(app.url("/api/attendance/0190f5a0-0000-7000-8000-000000000099"))
        .bearer_auth(&user.token)
        .json(&serde_json::json!({"student_name": "C"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_delete_twice_returns_not_found() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;
    let record = submit_attendance(&app, &user, &attendance_body("A", "B", "2024-01-01")).await;
    let url = app.url(&format!("/api/attendance/{}", record["record_id"].as_str().unwrap()));

    let response = app.api_client.delete(&url).bearer_auth(&user.token).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Attendance record deleted successfully");

    let response = app.api_client.delete(&url).bearer_auth(&user.token).send().await.unwrap();
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Public lookups
// ============================================================================

#[tokio::test]
async fn test_public_tutors_students_and_stats() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    submit_attendance(&app, &user, &attendance_body("Citra", "Y", "2024-01-05")).await;
    submit_attendance(&app, &user, &attendance_body("Ani", "X", "2024-01-10")).await;
    submit_attendance(&app, &user, &attendance_body("Citra", "X", "2024-02-01")).await;

    let tutors: Value = app
        .api_client
        .get(app.url("/api/tutors"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        tutors,
        serde_json::json!([{"name": "Ani", "email": null}, {"name": "Citra", "email": null}])
    );

    let students: Value = app
        .api_client
        .get(app.url("/api/students"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(students, serde_json::json!([{"name": "X"}, {"name": "Y"}]));

    let stats: Value = app
        .api_client
        .get(app.url("/api/stats?start_date=2024-01-01&end_date=2024-01-31"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        stats,
        serde_json::json!({"total": 2, "uniqueTutors": 2, "uniqueStudents": 2, "averagePerDay": 0.07})
    );
}
