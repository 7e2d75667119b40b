use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::notification;
use crate::state::AppState;

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(notification::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notification::unread_count),
        )
        .route("/api/notifications/read-all", put(notification::mark_all_read))
        .route("/api/notifications/:id/read", put(notification::mark_read))
}
