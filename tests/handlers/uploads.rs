use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::common::{register_and_login, TestApp, TestUser};

fn image_part(bytes: Vec<u8>, file_name: &str, mime: &str) -> Part {
    Part::bytes(bytes).file_name(file_name.to_string()).mime_str(mime).unwrap()
}

async fn upload(app: &TestApp, user: &TestUser, form: Form) -> reqwest::Response {
    app.api_client
        .post(app.url("/api/upload-proof"))
        .bearer_auth(&user.token)
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_upload_png_stores_object() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let form = Form::new()
        .text("note", "weekly session")
        .part("file", image_part(vec![7u8; 2048], "proof.png", "image/png"));
    let response = upload(&app, &user, form).await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "File uploaded successfully to cloud storage");
    assert_eq!(body["file_size"], 2048);
    assert_eq!(body["file_type"], "image/png");

    let key = body["file_name"].as_str().unwrap();
    assert!(key.starts_with("attendance-proofs/"));
    assert!(key.ends_with(".png"));
    assert!(body["url"].as_str().unwrap().ends_with(key));

    let (stored, content_type) = app.bucket.get(key).await.unwrap();
    assert_eq!(stored.len(), 2048);
    assert_eq!(content_type, "image/png");
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_upload_rejects_gif_before_bucket_write() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let form = Form::new().part("file", image_part(vec![1u8; 64], "anim.gif", "image/gif"));
    let response = upload(&app, &user, form).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNSUPPORTED_TYPE");

    assert!(app.bucket.is_empty().await);
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let form = Form::new().part("file", image_part(vec![0u8; 6 * 1024 * 1024], "big.jpg", "image/jpeg"));
    let response = upload(&app, &user, form).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "FILE_TOO_LARGE");

    assert!(app.bucket.is_empty().await);
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let response = upload(&app, &user, Form::new().text("note", "no file")).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["error"], "No file uploaded");
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_upload_rejects_second_file() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let form = Form::new()
        .part("file", image_part(vec![1u8; 32], "a.png", "image/png"))
        .part("file", image_part(vec![2u8; 32], "b.png", "image/png"));
    let response = upload(&app, &user, form).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_PARAMETER");

    assert!(app.bucket.is_empty().await);
    assert_eq!(app.spooled_files(), 0);
}

#[tokio::test]
async fn test_upload_requires_principal() {
    let app = TestApp::new().await;

    let form = Form::new().part("file", image_part(vec![1u8; 32], "a.png", "image/png"));
    let response = app
        .api_client
        .post(app.url("/api/upload-proof"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert!(app.bucket.is_empty().await);
}

#[tokio::test]
async fn test_file_url_list_and_delete() {
    let app = TestApp::new().await;
    let user = register_and_login(&app).await;

    let form = Form::new().part("file", image_part(vec![3u8; 128], "p.webp", "image/webp"));
    let body: Value = upload(&app, &user, form).await.json().await.unwrap();
    let key = body["file_name"].as_str().unwrap().to_string();

    let response = app
        .api_client
        .get(app.url(&format!("/api/file/{}", key)))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["file_name"], key.as_str());
    assert!(body["url"].as_str().unwrap().ends_with(&key));

    let response = app
        .api_client
        .get(app.url("/api/files"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(
        body["files"][0]["name"],
        key.strip_prefix("attendance-proofs/").unwrap()
    );

    let response = app
        .api_client
        .delete(app.url(&format!("/api/file/{}", key)))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "File deleted successfully from cloud storage");
    assert!(app.bucket.is_empty().await);
}
