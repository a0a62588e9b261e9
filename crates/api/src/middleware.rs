//! API middleware and shared state.

use tipline_core::ReportService;

use crate::rate_limit::RateLimiterState;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Report service; owns the authorization gate.
    pub report_service: ReportService,
    /// Per-IP and per-ticket rate limiters.
    pub rate_limiter: RateLimiterState,
}
