//! API endpoints.

mod health;
mod reports;

use axum::Router;

use crate::middleware::AppState;
use crate::rate_limit::RateLimiterState;

/// Create the API router.
pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/reports", reports::router(rate_limiter))
        .merge(health::router())
}
