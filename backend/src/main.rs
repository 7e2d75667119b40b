//! MicroLend Backend Server
//!
//! REST API for loan applications, approvals, disbursement, repayments and
//! borrower notifications.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;

use microlend_server::config::Config;
use microlend_server::middleware::{RateLimiter, IDLE_BUCKET_AGE};
use microlend_server::state::AppState;
use microlend_server::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        database = %config.database_url_masked(),
        "Starting MicroLend server"
    );

    let db_pool = db::create_pool(&config)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected successfully");

    if config.run_migrations {
        db::run_migrations(&db_pool)
            .await
            .context("Failed to run database migrations")?;
    }

    let state = AppState::new(db_pool, &config);

    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        state
            .auth_service
            .ensure_admin(email, password)
            .await
            .context("Failed to create bootstrap admin")?;
    }

    let rate_limiter = RateLimiter::new(config.rate_limit_rps);
    let _sweeper = rate_limiter.spawn_cleanup(IDLE_BUCKET_AGE, IDLE_BUCKET_AGE);
    tracing::info!("Rate limiter cleanup task started");

    let app = routes::create_router(state, &config, rate_limiter);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
