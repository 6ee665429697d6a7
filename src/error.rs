use thiserror::Error;
use std::collections::HashMap;
use serde::{Serialize, Deserialize};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// User-facing message for failures whose detail stays server-side.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Structured validation errors with field-level error mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationErrors {
    Single { field: String, message: String },
    Multiple { fields: HashMap<String, String> },
}

/// The custom error type for the application.
#[derive(Debug, Error)]
pub enum Error {
    /// No token was found in the header, cookie or session slot.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The token failed verification or does not resolve to a user.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Login with wrong credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A required request field is absent or blank.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A request parameter is present but unusable.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A validation error with field-level details.
    #[error("Validation error: {0:?}")]
    Validation(ValidationErrors),

    /// Uploaded file exceeds the size ceiling.
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// Uploaded file declares a content type outside the allow-list.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A not found error (resource does not exist).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A conflict error (resource already exists).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The external store rejected or failed a call.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// An internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A type alias for `Result<T, Error>` to simplify function signatures.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Upstream(format!("Unexpected payload from store: {}", err))
    }
}

/// Server-side detail attached to 5xx responses.
///
/// Only the development-mode `expose_error_details` middleware reads it;
/// otherwise it never leaves the process.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl Error {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::MissingField(_) => StatusCode::BAD_REQUEST,
            Error::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::FileTooLarge(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedType(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert custom Error to HTTP response
///
/// Client errors carry their message. Upstream and internal failures are
/// logged and answered with a fixed message; their detail rides along as an
/// `ErrorDetail` extension.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            Error::Validation(errors) => match errors {
                ValidationErrors::Single { field, message } => {
                    serde_json::json!({
                        "error": "Validation failed",
                        "code": "VALIDATION_ERROR",
                        "fields": {
                            field: message
                        }
                    })
                }
                ValidationErrors::Multiple { fields } => {
                    serde_json::json!({
                        "error": "Validation failed",
                        "code": "VALIDATION_ERROR",
                        "fields": fields
                    })
                }
            },
            Error::Unauthenticated(msg) => {
                serde_json::json!({ "error": msg, "code": "UNAUTHENTICATED" })
            }
            Error::InvalidToken(msg) => {
                serde_json::json!({ "error": msg, "code": "INVALID_TOKEN" })
            }
            Error::Authentication(msg) => {
                serde_json::json!({ "error": msg, "code": "AUTHENTICATION_FAILED" })
            }
            Error::MissingField(msg) => {
                serde_json::json!({ "error": msg, "code": "MISSING_FIELD" })
            }
            Error::InvalidParameter(msg) => {
                serde_json::json!({ "error": msg, "code": "INVALID_PARAMETER" })
            }
            Error::FileTooLarge(msg) => {
                serde_json::json!({ "error": msg, "code": "FILE_TOO_LARGE" })
            }
            Error::UnsupportedType(msg) => {
                serde_json::json!({ "error": msg, "code": "UNSUPPORTED_TYPE" })
            }
            Error::NotFound(msg) => {
                serde_json::json!({ "error": msg, "code": "NOT_FOUND" })
            }
            Error::Conflict(msg) => {
                serde_json::json!({ "error": msg, "code": "CONFLICT" })
            }
            Error::Upstream(_) => {
                serde_json::json!({
                    "error": "Upstream service error",
                    "code": "UPSTREAM_FAILURE",
                    "message": GENERIC_FAILURE_MESSAGE
                })
            }
            Error::Internal(_) => {
                serde_json::json!({
                    "error": "Internal server error",
                    "code": "INTERNAL_ERROR",
                    "message": GENERIC_FAILURE_MESSAGE
                })
            }
            Error::Config(_) => {
                serde_json::json!({
                    "error": "Configuration error",
                    "code": "CONFIG_ERROR",
                    "message": GENERIC_FAILURE_MESSAGE
                })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            response.extensions_mut().insert(ErrorDetail(self.to_string()));
        }
        response
    }
}
