//! Tipline server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tipline_api::{middleware::AppState, rate_limit::RateLimiterState, router as api_router};
use tipline_common::Config;
use tipline_core::ReportService;
use tipline_db::repositories::{MessageRepository, ReportRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tipline=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting tipline server...");

    // Load and validate configuration; a weak credential policy is a
    // startup failure, not a warning
    let config = Config::load()?;
    config.validate()?;

    // Connect to database
    let db = tipline_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    tipline_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Wire repositories and services explicitly; the store handle is
    // injected at construction, not reached through process-wide state
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let report_service = ReportService::new(report_repo, message_repo, &config.credentials)?;

    let rate_limiter = RateLimiterState::from_config(&config.rate_limit);
    let state = AppState {
        report_service,
        rate_limiter: rate_limiter.clone(),
    };

    // Periodic rate limiter cleanup
    {
        let rate_limiter = rate_limiter.clone();
        let max_window = config
            .rate_limit
            .auth_window_secs
            .max(config.rate_limit.create_window_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                rate_limiter.auth_limiter.cleanup(max_window).await;
                rate_limiter.create_limiter.cleanup(max_window).await;
            }
        });
    }

    let cors = if config.server.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .nest("/api", api_router(rate_limiter))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
