//! Report endpoints.
//!
//! Thin adapters over [`tipline_core::ReportService`]; every ticket-scoped
//! route resolves its report through the service's authorization gate.

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tipline_common::AppResult;
use tipline_core::CreateReportInput;
use tipline_db::entities::{
    message,
    report::{self, ReportStatus},
};
use validator::Validate;

use crate::{
    middleware::AppState,
    rate_limit::{rate_limit_auth_middleware, rate_limit_create_middleware, RateLimiterState},
    response::ApiResponse,
};

/// Create report router.
pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    let create = Router::new()
        .route("/", post(create_report))
        .layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limit_create_middleware,
        ));

    // One rate limit class for everything behind the authorization gate
    let scoped = Router::new()
        .route("/{ticket}", get(get_report))
        .route("/{ticket}/messages", post(post_message))
        .route("/{ticket}/status", post(set_status))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_auth_middleware,
        ));

    create.merge(scoped)
}

/// Create report request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 64))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub body: String,
}

/// Create report response.
///
/// The only response in the API that carries the access code; it cannot be
/// retrieved again afterwards.
#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    pub ticket: String,
    pub access_code: String,
}

/// Access code presented via query string.
#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    #[serde(default)]
    pub code: String,
}

/// Report response. Never includes the code hash.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub ticket: String,
    pub title: String,
    pub category: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageResponse>>,
}

impl ReportResponse {
    fn from_model(report: report::Model, messages: Option<Vec<message::Model>>) -> Self {
        Self {
            ticket: report.ticket,
            title: report.title,
            category: report.category,
            status: report.status,
            created_at: report.created_at.into(),
            body: report.body,
            messages: messages.map(|m| m.into_iter().map(MessageResponse::from).collect()),
        }
    }
}

/// Message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub role: message::MessageRole,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<message::Model> for MessageResponse {
    fn from(message: message::Model) -> Self {
        Self {
            role: message.role,
            body: message.body,
            created_at: message.created_at.into(),
        }
    }
}

/// Post message request.
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1))]
    pub body: String,
}

/// Set status request.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ReportStatus,
}

/// Create a report. Returns the ticket and the access code, exactly once.
async fn create_report(
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<ApiResponse<CreateReportResponse>> {
    req.validate()?;

    let created = state
        .report_service
        .create_report(CreateReportInput {
            title: req.title,
            category: req.category,
            body: req.body,
        })
        .await?;

    Ok(ApiResponse::created(CreateReportResponse {
        ticket: created.ticket,
        access_code: created.access_code,
    }))
}

/// Fetch a report and its thread.
async fn get_report(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    Query(query): Query<CodeQuery>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let fetched = state.report_service.fetch_report(&ticket, &query.code).await?;

    Ok(ApiResponse::ok(ReportResponse::from_model(
        fetched.report,
        Some(fetched.messages),
    )))
}

/// Append a reporter message to a report's thread.
async fn post_message(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    Query(query): Query<CodeQuery>,
    Json(req): Json<PostMessageRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    req.validate()?;

    let message = state
        .report_service
        .post_message(&ticket, &query.code, &req.body)
        .await?;

    Ok(ApiResponse::created(MessageResponse::from(message)))
}

/// Transition a report between open and closed.
async fn set_status(
    State(state): State<AppState>,
    Path(ticket): Path<String>,
    Query(query): Query<CodeQuery>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state
        .report_service
        .set_status(&ticket, &query.code, req.status)
        .await?;

    Ok(ApiResponse::ok(ReportResponse::from_model(report, None)))
}
