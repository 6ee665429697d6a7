//! Bearer-token authentication as a request extractor
//!
//! Handlers that need a principal take [`AuthenticatedUser`]; handlers where
//! the principal is optional take `Option<AuthenticatedUser>`. Routes that
//! mix public reads and authenticated writes on one path need no separate
//! layer this way.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use secrecy::ExposeSecret;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::users::{User, UserRole},
    services::{
        cookies::{extract_cookie_value, extract_token, TokenSources},
        jwt::get_user_id_from_token,
        users::find_user,
    },
    state::AppState,
};

/// Authenticated principal resolved from a bearer token
///
/// Inserted into the request extensions once resolved, so a second
/// extraction in the same request does not repeat the user lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

/// Token held by a server-side session layer, consulted after the header
/// and the cookie.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolves the principal for a request
///
/// # Token Sources
/// 1. **Authorization header**: `Bearer <token>`
/// 2. **Cookie**: the configured token cookie
/// 3. **Session**: a [`SessionToken`] request extension
///
/// # Errors
/// - `Unauthenticated` when no source carries a token
/// - `InvalidToken` when verification fails or the subject has no user row
async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthenticatedUser> {
    let auth_header = parts.headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());
    let cookie = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| extract_cookie_value(h, &state.config.cookies.token_name));
    let session = parts.extensions.get::<SessionToken>().map(|s| s.0.as_str());

    let token = extract_token(TokenSources {
        auth_header,
        cookie: cookie.as_deref(),
        session,
    })?;

    let user_id = get_user_id_from_token(&token, state.config.jwt.secret.expose_secret())?;

    let user = find_user(state.stores.admin.as_ref(), user_id)
        .await?
        .ok_or_else(|| Error::InvalidToken("User not found".to_string()))?;

    Ok(user.into())
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(parts, state).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

impl OptionalFromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Option<Self>, Self::Rejection> {
        match <AuthenticatedUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::debug!(error = %e, "Optional authentication skipped");
                Ok(None)
            }
        }
    }
}
