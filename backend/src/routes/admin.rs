//! Admin routes; every handler requires the `ADMIN` role

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::admin;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/applications", get(admin::list_applications))
        .route(
            "/api/admin/applications/:id/review",
            post(admin::review_application),
        )
        .route(
            "/api/admin/applications/:id/approve",
            post(admin::approve_application),
        )
        .route(
            "/api/admin/applications/:id/reject",
            post(admin::reject_application),
        )
        .route(
            "/api/admin/applications/:id/progress",
            put(admin::update_progress),
        )
        .route(
            "/api/admin/applications/:id/confirm-fee",
            post(admin::confirm_fee),
        )
        .route("/api/admin/loans", get(admin::list_loans))
        .route("/api/admin/loans/:id/disburse", post(admin::disburse_loan))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).put(admin::update_settings),
        )
        .route("/api/admin/analytics", get(admin::analytics))
        .route("/api/admin/withdrawals", get(admin::list_withdrawals))
        .route(
            "/api/admin/withdrawals/:id/approve",
            post(admin::approve_withdrawal),
        )
        .route(
            "/api/admin/withdrawals/:id/reject",
            post(admin::reject_withdrawal),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/:id/kyc", put(admin::review_kyc))
        .route(
            "/api/admin/users/:id/credit-score",
            put(admin::set_credit_score),
        )
        .route(
            "/api/admin/contact-messages",
            get(admin::list_contact_messages),
        )
        .route(
            "/api/admin/contact-messages/:id/handled",
            put(admin::mark_contact_handled),
        )
}
