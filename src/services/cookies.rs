use crate::error::{Error, Result};

/// Cookie name for the bearer token
pub const TOKEN_COOKIE: &str = "token";

/// Cookie security configuration
///
/// Controls how the token cookie is created and secured for browser clients
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Name of the token cookie (default: "token")
    pub token_name: String,
    /// HttpOnly flag prevents JavaScript access (XSS protection)
    pub http_only: bool,
    /// Secure flag ensures HTTPS-only transmission (should be true in production)
    pub secure: bool,
    /// SameSite attribute for CSRF protection
    pub same_site: SameSite,
    /// Path attribute to limit cookie scope
    pub path: String,
    /// Cookie lifetime in seconds
    pub max_age_seconds: i64,
}

/// SameSite cookie attribute for CSRF protection
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Strict mode - cookie not sent with cross-site requests
    Strict,
    /// Lax mode - cookie sent with top-level navigations
    Lax,
    /// None mode - cookie sent with all requests (requires Secure)
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            token_name: TOKEN_COOKIE.to_string(),
            http_only: true,
            secure: false, // Set to true in production
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_seconds: 24 * 60 * 60,
        }
    }
}

/// Places a bearer token can arrive from, in the order they are consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenSources<'a> {
    /// Raw `Authorization` header value
    pub auth_header: Option<&'a str>,
    /// Value of the token cookie
    pub cookie: Option<&'a str>,
    /// Token held in a server-side session slot
    pub session: Option<&'a str>,
}

/// Picks the bearer token from the request sources.
///
/// Priority order:
/// 1. Authorization header (`Bearer <token>`)
/// 2. Token cookie
/// 3. Server-side session slot
///
/// Empty values are treated as absent.
pub fn extract_token(sources: TokenSources<'_>) -> Result<String> {
    if let Some(header) = sources.auth_header {
        if let Some(token) = header.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }
    }

    if let Some(cookie) = sources.cookie {
        if !cookie.is_empty() {
            return Ok(cookie.to_string());
        }
    }

    if let Some(session) = sources.session {
        if !session.is_empty() {
            return Ok(session.to_string());
        }
    }

    Err(Error::Unauthenticated("No token provided".to_string()))
}

/// Extract specific cookie value from a Cookie header
pub fn extract_cookie_value(cookie_str: &str, cookie_name: &str) -> Option<String> {
    cookie_str
        .split(';')
        .map(|s| s.trim())
        .find_map(|cookie| {
            cookie
                .strip_prefix(cookie_name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|value| value.to_string())
}

/// Builds a Set-Cookie header value carrying the bearer token
///
/// # Example
/// ```rust,no_run
/// use tutor_attendance::services::cookies::{build_token_cookie, CookieConfig};
///
/// let cookie = build_token_cookie("my_token", &CookieConfig::default());
/// // Returns: "token=my_token; HttpOnly; SameSite=Lax; Path=/; Max-Age=86400"
/// ```
pub fn build_token_cookie(token: &str, config: &CookieConfig) -> String {
    format!(
        "{}={}{}{}; SameSite={}; Path={}; Max-Age={}",
        config.token_name,
        token,
        if config.http_only { "; HttpOnly" } else { "" },
        if config.secure { "; Secure" } else { "" },
        config.same_site.as_str(),
        config.path,
        config.max_age_seconds
    )
}

/// Builds a Set-Cookie header value that clears the token cookie
///
/// Used during logout to invalidate the cookie by setting Max-Age=0
pub fn build_clear_token_cookie(config: &CookieConfig) -> String {
    format!(
        "{}=; HttpOnly; SameSite={}; Path={}; Max-Age=0",
        config.token_name,
        config.same_site.as_str(),
        config.path
    )
}
