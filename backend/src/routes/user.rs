//! User route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::user;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/profile",
            get(user::get_profile).put(user::update_profile),
        )
        .route("/api/users/dashboard", get(user::dashboard))
        .route("/api/users/kyc", post(user::submit_kyc))
        .route("/api/users/activity", get(user::activity))
}
