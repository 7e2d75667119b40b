//! Borrower application routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::application;
use crate::state::AppState;

pub fn application_routes() -> Router<AppState> {
    Router::new()
        .route("/api/applications", post(application::submit_application))
        .route("/api/applications/mine", get(application::list_my_applications))
        .route("/api/applications/:id", get(application::get_my_application))
        .route(
            "/api/applications/:id/documents",
            post(application::upload_document),
        )
}
