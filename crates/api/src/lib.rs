//! HTTP API layer for tipline.
//!
//! A thin adapter over the core report service: request parsing, response
//! shaping, and rate limiting live here; every report-scoped handler goes
//! through the core's authorization gate and holds no business logic of its
//! own.

pub mod endpoints;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitWindow, RateLimiterState};
