use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::model::{Settings, UpdateSettingsRequest};
use crate::error::ApiError;

const SELECT_SETTINGS: &str = r#"
    SELECT interest_rate, processing_fee_percent, min_loan, max_loan, max_months,
           auto_approval_enabled, updated_by, updated_at
    FROM settings
    WHERE id = 1
"#;

#[derive(Clone)]
pub struct SettingsService {
    db_pool: PgPool,
}

impl SettingsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn get(&self) -> Result<Settings, ApiError> {
        Self::load(&self.db_pool).await
    }

    /// Read settings on any executor (pool or open transaction)
    pub async fn load<'e, E: PgExecutor<'e>>(executor: E) -> Result<Settings, ApiError> {
        sqlx::query_as::<_, Settings>(SELECT_SETTINGS)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| ApiError::NotFound("Platform settings are not configured".to_string()))
    }

    pub async fn update(
        &self,
        request: UpdateSettingsRequest,
        admin_id: Uuid,
    ) -> Result<Settings, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let current = sqlx::query_as::<_, Settings>(&format!("{SELECT_SETTINGS} FOR UPDATE"))
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Platform settings are not configured".to_string()))?;

        let merged = request.apply(&current)?;

        let updated = sqlx::query_as::<_, Settings>(
            r#"
            UPDATE settings
            SET interest_rate = $1, processing_fee_percent = $2, min_loan = $3, max_loan = $4,
                max_months = $5, auto_approval_enabled = $6, updated_by = $7, updated_at = NOW()
            WHERE id = 1
            RETURNING interest_rate, processing_fee_percent, min_loan, max_loan, max_months,
                      auto_approval_enabled, updated_by, updated_at
            "#,
        )
        .bind(merged.interest_rate)
        .bind(merged.processing_fee_percent)
        .bind(merged.min_loan)
        .bind(merged.max_loan)
        .bind(merged.max_months)
        .bind(merged.auto_approval_enabled)
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            admin_id = %admin_id,
            interest_rate = %updated.interest_rate,
            max_loan = %updated.max_loan,
            "Platform settings updated"
        );

        Ok(updated)
    }
}
