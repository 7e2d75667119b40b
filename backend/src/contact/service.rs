use sqlx::PgPool;
use uuid::Uuid;

use super::model::{ContactMessage, ContactRequest};
use crate::error::ApiError;
use crate::models::{PaginatedResponse, PaginationParams};

#[derive(Clone)]
pub struct ContactService {
    db_pool: PgPool,
}

impl ContactService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn submit(&self, request: ContactRequest) -> Result<ContactMessage, ApiError> {
        let message = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (id, name, email, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.email.trim().to_lowercase())
        .bind(request.subject.as_deref())
        .bind(&request.message)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(message_id = %message.id, "Contact message received");
        Ok(message)
    }

    pub async fn list(
        &self,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<ContactMessage>, ApiError> {
        let (page, limit) = pagination.resolve();

        let items = sqlx::query_as::<_, ContactMessage>(
            "SELECT * FROM contact_messages ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.db_pool)
            .await?;

        Ok(PaginatedResponse {
            items,
            total,
            page,
            limit,
        })
    }

    pub async fn mark_handled(&self, id: Uuid) -> Result<ContactMessage, ApiError> {
        sqlx::query_as::<_, ContactMessage>(
            "UPDATE contact_messages SET handled = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))
    }
}
