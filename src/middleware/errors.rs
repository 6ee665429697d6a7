//! Response rewriting for failures and preflights.

use std::any::Any;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::{Error, ErrorDetail};

/// Largest error body the detail middleware will rewrite.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// Folds the server-side detail of a 5xx response into its body as
/// `message` and `stack`. Installed only in development.
pub async fn expose_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let mut value = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or_else(|_| Value::Object(Default::default())),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read error body");
            Value::Object(Default::default())
        }
    };

    if let Some(object) = value.as_object_mut() {
        object.insert("message".into(), Value::String(detail.clone()));
        object.insert("stack".into(), Value::String(detail));
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(value.to_string()))
}

/// Answers CORS preflights with 204 instead of 200.
///
/// Sits outside the CORS layer, which has already filled in the
/// `Access-Control-*` headers by the time the response comes back here.
pub async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_preflight = request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = next.run(request).await;
    if is_preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
        *response.body_mut() = Body::empty();
        response.headers_mut().remove(header::CONTENT_LENGTH);
    }
    response
}

/// Panic handler for `CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    Error::Internal(format!("Handler panicked: {}", detail)).into_response()
}
