//! Router assembly: routes, CORS, security headers, limits and tracing.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{self, HeaderName, HeaderValue},
        request, Method,
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use regex::Regex;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    config::CorsConfig,
    handlers::{self, attendance, auth, health, students, uploads},
    middleware::{expose_error_details, panic_response, preflight_no_content, rate_limit_middleware},
    state::AppState,
};

/// Origins always allowed, in addition to configured ones.
pub const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "https://tutor-app.sigmath.net",
    "https://be.sigmath.net",
];

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' 'unsafe-inline'; script-src 'self'; img-src 'self' data: https:";

/// Matches request origins against the fixed list, configured extras and
/// configured patterns.
#[derive(Debug, Clone)]
struct OriginPolicy {
    exact: Vec<String>,
    patterns: Vec<Regex>,
}

impl OriginPolicy {
    fn from_config(config: &CorsConfig) -> Self {
        let exact = DEFAULT_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .chain(config.extra_origins.iter().map(|o| o.trim().to_string()))
            .filter(|o| !o.is_empty())
            .collect();

        let patterns = config
            .origin_patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid CORS origin pattern");
                    None
                }
            })
            .collect();

        Self { exact, patterns }
    }

    fn allows(&self, origin: &str) -> bool {
        self.exact.iter().any(|o| o == origin) || self.patterns.iter().any(|p| p.is_match(origin))
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let policy = OriginPolicy::from_config(config);

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
            },
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/check", get(auth::check))
        // attendance
        .route("/tutors", get(attendance::list_tutors))
        .route("/stats", get(attendance::stats))
        .route(
            "/attendance",
            get(attendance::list_records).post(attendance::submit_record),
        )
        .route(
            "/attendance/{record_id}",
            patch(attendance::update_record).delete(attendance::delete_record),
        )
        .route("/records/{record_id}", get(attendance::get_record))
        // students
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route("/students/stats", get(students::student_stats))
        .route(
            "/students/{id}",
            get(students::get_student)
                .patch(students::update_student)
                .delete(students::delete_student),
        )
        // uploads
        .route("/upload-proof", post(uploads::upload_proof))
        .route(
            "/file/{*file_name}",
            get(uploads::get_file_url).delete(uploads::delete_file),
        )
        .route("/files", get(uploads::list_files))
}

/// Builds the full application router
///
/// Layers, innermost first: body limit, rate limit, CORS, preflight 204,
/// panic catching, development error detail, request tracing, security
/// headers.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(cors_layer(&config.cors))
        .layer(from_fn(preflight_no_content))
        .layer(CatchPanicLayer::custom(panic_response));

    if config.is_development() {
        router = router.layer(from_fn(expose_error_details));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("same-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ))
        .with_state(state)
}
