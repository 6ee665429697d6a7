//! Fixed-window request limiter keyed by client address.
//!
//! Windows live in a `DashMap`; a background task drops windows that have
//! ended so idle clients do not accumulate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::{config::RateLimitConfig, state::AppState};

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Requests under this prefix are counted.
pub const LIMITED_PREFIX: &str = "/api/";

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window ends
    pub reset_seconds: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    window: Duration,
    max_requests: u32,
    cleanup_task: Option<JoinHandle<()>>,
}

impl RateLimiter {
    /// Creates the limiter. The cleanup task is spawned when a Tokio runtime
    /// is available.
    pub fn new(config: &RateLimitConfig) -> Self {
        let windows = Arc::new(DashMap::new());
        let window = Duration::from_secs(config.window_seconds.max(1));

        let cleanup_task = tokio::runtime::Handle::try_current()
            .ok()
            .map(|handle| handle.spawn(Self::cleanup_loop(Arc::clone(&windows), window)));

        Self {
            windows,
            window,
            max_requests: config.max_requests,
            cleanup_task,
        }
    }

    async fn cleanup_loop(windows: Arc<DashMap<String, Window>>, window: Duration) {
        let mut interval = tokio::time::interval(window);
        loop {
            interval.tick().await;
            let now = Instant::now();
            windows.retain(|_, w| now.duration_since(w.started_at) < window);
        }
    }

    /// Counts a request from `key` and reports whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.duration_since(entry.started_at);
        let reset = self.window.saturating_sub(elapsed);

        RateDecision {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_seconds: reset.as_secs_f64().ceil() as u64,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(task) = self.cleanup_task.take() {
            task.abort();
        }
    }
}

fn apply_headers(response: &mut Response, decision: &RateDecision) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(decision.reset_seconds));
}

/// Client key: peer address, or `unknown` when the server was started
/// without connect info.
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Limits `/api/*` requests per client address.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(LIMITED_PREFIX) {
        return next.run(request).await;
    }

    let key = client_key(&request);
    let decision = state.rate_limiter.check(&key);

    if !decision.allowed {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        let mut response = (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE).into_response();
        apply_headers(&mut response, &decision);
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(decision.reset_seconds));
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(&mut response, &decision);
    response
}
