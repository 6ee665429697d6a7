use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::ExposeSecret;

use super::log_handler_error;
use crate::{
    error::Result,
    extract::JsonBody,
    middleware::auth::AuthenticatedUser,
    models::users::{LoginUser, RegisterUser},
    services::{
        cookies::{build_clear_token_cookie, build_token_cookie},
        users,
    },
    state::AppState,
};

/// JSON response carrying a Set-Cookie header
pub struct CookieResponse {
    json_body: serde_json::Value,
    cookie: String,
}

impl IntoResponse for CookieResponse {
    fn into_response(self) -> Response {
        let (mut parts, body) = Json(self.json_body).into_response().into_parts();

        match HeaderValue::from_str(&self.cookie) {
            Ok(cookie) => {
                parts.headers.append(SET_COOKIE, cookie);
            }
            Err(e) => tracing::warn!(error = %e, "Cookie is not a valid header value"),
        }

        Response::from_parts(parts, body)
    }
}

/// POST /api/auth/register
///
/// Registers a new user.
///
/// # Request Body
/// - `email`: unique email address
/// - `password`: at least 8 characters
/// - `name`: display name
/// - `role`: optional, `tutor` or `user` (default `user`)
///
/// # HTTP Status Codes
/// - `201 CREATED`: `{user}`
/// - `400 BAD_REQUEST`: invalid email, weak password, bad role
/// - `409 CONFLICT`: email already registered
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterUser>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let user = users::register_user(state.stores.admin.as_ref(), request)
        .await
        .inspect_err(|e| log_handler_error("register", e))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user })),
    ))
}

/// POST /api/auth/login
///
/// Authenticates with email and password.
///
/// Returns `{message, token, user}` and sets the token cookie, so browser
/// clients authenticate by cookie and API clients by `Authorization:
/// Bearer <token>`.
///
/// # HTTP Status Codes
/// - `200 OK`: authenticated
/// - `401 UNAUTHORIZED`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginUser>,
) -> Result<CookieResponse> {
    let login_result = users::login_user(
        state.stores.admin.as_ref(),
        request,
        state.config.jwt.secret.expose_secret(),
        state.config.jwt.expiration_hours,
    )
    .await
    .inspect_err(|e| log_handler_error("login", e))?;

    let cookie = build_token_cookie(&login_result.token, &state.config.cookies);

    Ok(CookieResponse {
        json_body: serde_json::json!({
            "message": "Login successful",
            "token": login_result.token,
            "user": login_result.user,
        }),
        cookie,
    })
}

/// POST /api/auth/logout
///
/// Clears the token cookie. Tokens are stateless, so a copied bearer token
/// stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> CookieResponse {
    CookieResponse {
        json_body: serde_json::json!({ "message": "Logout successful" }),
        cookie: build_clear_token_cookie(&state.config.cookies),
    }
}

/// GET /api/auth/check
///
/// Reports the principal behind the request token.
pub async fn check(user: AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "authenticated": true,
        "user": user,
    }))
}
