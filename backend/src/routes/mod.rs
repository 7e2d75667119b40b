//! Route definitions for the MicroLend API

mod admin;
mod application;
mod auth;
mod loan;
mod notification;
mod public;
mod user;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::middleware::{self, RateLimiter};
use crate::state::AppState;

pub use admin::admin_routes;
pub use application::application_routes;
pub use auth::auth_routes;
pub use loan::loan_routes;
pub use notification::notification_routes;
pub use public::public_routes;
pub use user::user_routes;

/// Full application router with the middleware stack applied
pub fn create_router(state: AppState, config: &Config, rate_limiter: RateLimiter) -> Router {
    // Base64 inflates uploads by a third; leave room for the JSON around it
    let body_limit = config.max_upload_bytes / 3 * 4 + 64 * 1024;

    let router = Router::new()
        .merge(public_routes())
        .merge(auth_routes())
        .merge(application_routes())
        .merge(loan_routes())
        .merge(user_routes())
        .merge(notification_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(middleware::security_headers));

    let router = if config.environment.is_production() {
        router.layer(from_fn(middleware::hsts_header))
    } else {
        router
    };

    router
        .layer(from_fn(middleware::request_tracing))
        .layer(from_fn_with_state(rate_limiter, middleware::rate_limit))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.trim().is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
}

