//! API integration tests over a mock database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use tipline_api::{middleware::AppState, rate_limit::RateLimiterState, router};
use tipline_common::config::{Argon2Config, CodePolicy, CredentialConfig, RateLimitConfig};
use tipline_core::{CodeHasher, ReportService};
use tipline_db::entities::report::{self, ReportStatus};
use tipline_db::repositories::{MessageRepository, ReportRepository};
use tower::ServiceExt;

fn test_credentials() -> CredentialConfig {
    CredentialConfig {
        ticket_length: 8,
        code_policy: CodePolicy::Alphanumeric,
        code_length: 24,
        // Minimal costs so the test suite stays fast
        argon2: Argon2Config {
            memory_kib: 8,
            time_cost: 1,
            parallelism: 1,
        },
    }
}

fn mock_report(code: &str) -> report::Model {
    let hasher = CodeHasher::new(&test_credentials()).unwrap();
    report::Model {
        id: "r1".to_string(),
        ticket: "ABCDEFGH".to_string(),
        title: "Incident A".to_string(),
        category: None,
        body: "details".to_string(),
        code_hash: hasher.hash(code).unwrap(),
        status: ReportStatus::Open,
        created_at: Utc::now().into(),
    }
}

fn app_with(db: DatabaseConnection) -> Router {
    let db = Arc::new(db);
    let service = ReportService::new(
        ReportRepository::new(Arc::clone(&db)),
        MessageRepository::new(db),
        &test_credentials(),
    )
    .unwrap();

    let rate_limiter = RateLimiterState::from_config(&RateLimitConfig::default());
    let state = AppState {
        report_service: service,
        rate_limiter: rate_limiter.clone(),
    };

    Router::new()
        .nest("/api", router(rate_limiter))
        .with_state(state)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_report_returns_ticket_and_code_once() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[mock_report("irrelevant")]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();
    let app = app_with(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"title":"Incident A","body":"details"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["ticket"].as_str().unwrap().len(), 8);
    assert_eq!(json["access_code"].as_str().unwrap().len(), 24);
    assert!(json.get("code_hash").is_none());
}

#[tokio::test]
async fn test_create_report_rejects_empty_title() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"title":"","body":"details"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_code_and_unknown_ticket_are_indistinguishable() {
    let with_report = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[mock_report("the-right-code-here-ok")]])
        .into_connection();
    let without_report = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<report::Model>::new()])
        .into_connection();

    let wrong_code = app_with(with_report)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ABCDEFGH?code=totally-wrong-code")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let unknown_ticket = app_with(without_report)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ZZZZZZZZ?code=totally-wrong-code")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(wrong_code.status(), StatusCode::NOT_FOUND);
    assert_eq!(unknown_ticket.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_bytes(wrong_code).await,
        body_bytes(unknown_ticket).await
    );
}

#[tokio::test]
async fn test_missing_code_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[mock_report("the-right-code-here-ok")]])
        .into_connection();

    let response = app_with(db)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ABCDEFGH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_code_does_not_reveal_ticket_existence() {
    let with_report = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[mock_report("the-right-code-here-ok")]])
        .into_connection();
    let without_report = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<report::Model>::new()])
        .into_connection();

    let known = app_with(with_report)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ABCDEFGH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let unknown = app_with(without_report)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ZZZZZZZZ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(known.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(known).await, body_bytes(unknown).await);
}

#[tokio::test]
async fn test_fetch_with_correct_code_returns_report_without_hash() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[mock_report("the-right-code-here-ok")]])
        .append_query_results([Vec::<tipline_db::entities::message::Model>::new()])
        .into_connection();

    let response = app_with(db)
        .oneshot(
            Request::builder()
                .uri("/api/reports/ABCDEFGH?code=the-right-code-here-ok")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["ticket"], "ABCDEFGH");
    assert_eq!(json["status"], "open");
    assert_eq!(json["messages"].as_array().unwrap().len(), 0);
    assert!(json.get("code_hash").is_none());
    assert!(!String::from_utf8_lossy(&body).contains("argon2"));
}

#[tokio::test]
async fn test_malformed_ticket_is_validation_error() {
    let app = app_with(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/short?code=whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_attempts_are_rate_limited_per_ticket() {
    let limits = RateLimitConfig {
        auth_max_attempts: 2,
        ..RateLimitConfig::default()
    };

    // Each attempt needs its own lookup result
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<report::Model>::new()])
        .append_query_results([Vec::<report::Model>::new()])
        .into_connection();

    let db = Arc::new(db);
    let service = ReportService::new(
        ReportRepository::new(Arc::clone(&db)),
        MessageRepository::new(db),
        &test_credentials(),
    )
    .unwrap();
    let rate_limiter = RateLimiterState::from_config(&limits);
    let state = AppState {
        report_service: service,
        rate_limiter: rate_limiter.clone(),
    };
    let app = Router::new()
        .nest("/api", router(rate_limiter))
        .with_state(state);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/reports/ABCDEFGH?code=guess")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/ABCDEFGH?code=guess")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
