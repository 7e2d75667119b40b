//! Banner and health check

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::db;

pub async fn root() -> &'static str {
    "MicroLend API Server"
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: String,
    version: &'static str,
}

/// GET /health - 503 when the database is unreachable
pub async fn health_check(State(pool): State<PgPool>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, database) = match db::check_health(&pool).await {
        Ok(()) => (StatusCode::OK, "healthy", "connected".to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                "unreachable".to_string(),
            )
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
