//! Unauthenticated routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{public, system};
use crate::state::AppState;

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health_check))
        .route("/api/public/settings", get(public::public_settings))
        .route("/api/public/calculate", post(public::calculate_loan))
        .route("/api/public/contact", post(public::submit_contact))
}
