pub mod attendance;
pub mod auth;
pub mod health;
pub mod students;
pub mod uploads;

use axum::{http::StatusCode, Json};

use crate::error::Error;

/// Fallback for unmatched routes.
pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Endpoint not found" })),
    )
}

fn log_handler_error(operation: &str, e: &Error) {
    if e.status().is_client_error() {
        tracing::warn!(operation = operation, error = %e, "Handler operation failed");
    } else {
        tracing::error!(operation = operation, error = %e, "Handler operation failed");
    }
}
