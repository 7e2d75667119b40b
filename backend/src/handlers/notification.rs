//! Notification polling handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use super::{ApiPath, ApiQuery, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{ApiResponse, PaginatedResponse};
use crate::notification::{ListNotificationsQuery, Notification, NotificationService, UnreadCount};

/// GET /api/notifications
pub async fn list_notifications(
    State(notifications): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    WithRejection(Query(query), _): ApiQuery<ListNotificationsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Notification>>>, ApiError> {
    let page = notifications.list_for_user(user.user_id, query).await?;
    Ok(Json(ApiResponse::ok("Notifications", page)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(notifications): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<UnreadCount>>, ApiError> {
    let unread = notifications.unread_count(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Unread count", UnreadCount { unread })))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read(
    State(notifications): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = notifications.mark_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok("Marked as read", notification)))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(notifications): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, ApiError> {
    let updated = notifications.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::ok(
        "All notifications marked as read",
        MarkAllReadResponse { updated },
    )))
}
