use sqlx::PgPool;
use uuid::Uuid;

use super::model::{ListNotificationsQuery, Notification, NotificationKind};
use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};

#[derive(Clone)]
pub struct NotificationService {
    db_pool: PgPool,
}

impl NotificationService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Record a notification for `user_id`.
    ///
    /// Failures are logged and swallowed: a lost notification never fails
    /// the lending operation that triggered it.
    pub async fn notify(&self, user_id: Uuid, kind: NotificationKind, title: &str, message: &str) {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, kind)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(kind)
        .execute(&self.db_pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id = %user_id, error = %e, title, "Failed to record notification");
        }
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        query: ListNotificationsQuery,
    ) -> Result<PaginatedResponse<Notification>, ApiError> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();

        let items = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(query.unread_only)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE)",
        )
        .bind(user_id)
        .bind(query.unread_only)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            items,
            total,
            page,
            limit,
        })
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, ApiError> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();
        Ok(updated)
    }
}
