//! API rate limiting middleware.
//!
//! The authorization gate is the only brute-force surface for access codes,
//! so report-scoped routes are limited per client IP and per ticket;
//! report creation gets its own, stricter window.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tipline_common::config::RateLimitConfig;

/// A fixed rate limit window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitWindow {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitWindow {
    /// Create a new rate limit window.
    #[must_use]
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Rate limit state for a single key.
#[derive(Debug, Clone)]
struct WindowState {
    /// Request count in current window.
    count: u32,
    /// Window start time.
    window_start: Instant,
}

impl WindowState {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }
}

/// API rate limiter.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    /// State per key (client IP or ticket).
    states: Arc<RwLock<HashMap<String, WindowState>>>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str, window: RateLimitWindow) -> RateLimitResult {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let duration = Duration::from_secs(window.window_secs);

        let state = states
            .entry(key.to_string())
            .or_insert_with(WindowState::new);

        // Check if window has expired
        if now.duration_since(state.window_start) >= duration {
            state.count = 0;
            state.window_start = now;
        }

        // Check if rate limited
        if state.count >= window.max_requests {
            let retry_after = duration
                .saturating_sub(now.duration_since(state.window_start))
                .as_secs();
            return RateLimitResult::Limited { retry_after };
        }

        // Increment count and allow
        state.count += 1;
        let remaining = window.max_requests.saturating_sub(state.count);

        RateLimitResult::Allowed {
            remaining,
            limit: window.max_requests,
            reset: duration
                .saturating_sub(now.duration_since(state.window_start))
                .as_secs(),
        }
    }

    /// Clean up expired entries.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let max_window = Duration::from_secs(max_window_secs * 2);

        states.retain(|_, state| now.duration_since(state.window_start) < max_window);
    }

    /// Get the number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

/// Rate limit check result.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed.
    Allowed {
        /// Remaining requests in window.
        remaining: u32,
        /// Total limit.
        limit: u32,
        /// Seconds until window reset.
        reset: u64,
    },
    /// Request is rate limited.
    Limited {
        /// Seconds until rate limit resets.
        retry_after: u64,
    },
}

/// Rate limiter state for middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    /// Whether rate limiting is active at all.
    pub enabled: bool,
    /// Limiter for authorization attempts (report-scoped routes).
    pub auth_limiter: ApiRateLimiter,
    /// Limiter for report creation.
    pub create_limiter: ApiRateLimiter,
    /// Window applied to authorization attempts.
    pub auth_window: RateLimitWindow,
    /// Window applied to report creation.
    pub create_window: RateLimitWindow,
}

impl RateLimiterState {
    /// Build rate limiter state from configuration.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            auth_limiter: ApiRateLimiter::new(),
            create_limiter: ApiRateLimiter::new(),
            auth_window: RateLimitWindow::new(config.auth_max_attempts, config.auth_window_secs),
            create_window: RateLimitWindow::new(
                config.create_max_requests,
                config.create_window_secs,
            ),
        }
    }
}

/// Rate limit error response.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests",
                "retryAfter": self.retry_after
            }
        });

        (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("Retry-After", self.retry_after.to_string()),
                ("Content-Type", "application/json".to_string()),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

/// Extract client IP from request.
fn extract_client_ip(req: &Request<Body>) -> Option<IpAddr> {
    // Try X-Forwarded-For header first
    if let Some(xff) = req.headers().get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    // Try X-Real-IP header
    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

/// Extract the ticket path segment from `/reports/{ticket}[/...]`.
fn extract_ticket(req: &Request<Body>) -> Option<&str> {
    let path = req.uri().path();
    let rest = path.split("/reports/").nth(1)?;
    let ticket = rest.split('/').next()?;
    (!ticket.is_empty()).then_some(ticket)
}

/// Rate limiting middleware for report-scoped (authorization) routes.
///
/// Checks both the client IP and the targeted ticket, so a distributed
/// guessing attempt against one ticket is still throttled.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !limiter.enabled {
        return Ok(next.run(req).await);
    }

    if let Some(ticket) = extract_ticket(&req) {
        let key = format!("ticket:{ticket}");
        if let RateLimitResult::Limited { retry_after } =
            limiter.auth_limiter.check(&key, limiter.auth_window).await
        {
            return Err(RateLimitError { retry_after });
        }
    }

    let key = extract_client_ip(&req)
        .map_or_else(|| "ip:unknown".to_string(), |ip| format!("ip:{ip}"));

    run_with_limit(&limiter.auth_limiter, &key, limiter.auth_window, req, next).await
}

/// Rate limiting middleware for report creation.
pub async fn rate_limit_create_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    if !limiter.enabled {
        return Ok(next.run(req).await);
    }

    let key = extract_client_ip(&req)
        .map_or_else(|| "ip:unknown".to_string(), |ip| format!("ip:{ip}"));

    run_with_limit(
        &limiter.create_limiter,
        &key,
        limiter.create_window,
        req,
        next,
    )
    .await
}

async fn run_with_limit(
    limiter: &ApiRateLimiter,
    key: &str,
    window: RateLimitWindow,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    match limiter.check(key, window).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;

            // Add rate limit headers
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());

            Ok(response)
        }
        RateLimitResult::Limited { retry_after } => Err(RateLimitError { retry_after }),
    }
}
