use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{
    merge_activity, ActivityItem, ActivityQuery, ApplicationCounts, Dashboard, ListUsersQuery,
    SubmitKycRequest, UpdateProfileRequest,
};
use crate::application::Application;
use crate::error::ApiError;
use crate::lending::ApplicationStatus;
use crate::loan::{LoanService, Transaction};
use crate::models::{
    KycStatus, PaginatedResponse, PaginationParams, User, UserResponse, USER_COLUMNS,
};
use crate::notification::{NotificationKind, NotificationService};

#[derive(Clone)]
pub struct UserService {
    db_pool: PgPool,
    loans: LoanService,
    notifications: NotificationService,
}

impl UserService {
    pub fn new(db_pool: PgPool, loans: LoanService, notifications: NotificationService) -> Self {
        Self {
            db_pool,
            loans,
            notifications,
        }
    }

    async fn find(&self, user_id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserResponse, ApiError> {
        Ok(self.find(user_id).await?.into())
    }

    /// Update the fields present in the request, leave the rest alone
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name), phone = COALESCE($2, phone),
                address = COALESCE($3, address), updated_at = NOW()
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.full_name.as_deref())
        .bind(request.phone.as_deref())
        .bind(request.address.as_deref())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        tracing::debug!(user_id = %user_id, "Profile updated");
        Ok(user.into())
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<Dashboard, ApiError> {
        let user = self.find(user_id).await?;

        let rows: Vec<(ApplicationStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;
        let applications = count_applications(&rows);

        let total_repaid = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM repayments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(Dashboard {
            user: user.into(),
            active_loan: self.loans.active_loan(user_id).await?,
            applications,
            total_repaid,
            unread_notifications: self.notifications.unread_count(user_id).await?,
        })
    }

    /// Submit KYC documents for verification
    pub async fn submit_kyc(
        &self,
        user_id: Uuid,
        request: SubmitKycRequest,
    ) -> Result<UserResponse, ApiError> {
        let current = self.find(user_id).await?;
        if current.kyc_status == KycStatus::Verified {
            return Err(ApiError::Conflict("KYC is already verified".to_string()));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET kyc_status = $1, kyc_document_type = $2, kyc_document_number = $3,
                kyc_submitted_at = NOW(), updated_at = NOW()
            WHERE id = $4
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(KycStatus::Pending)
        .bind(&request.document_type)
        .bind(&request.document_number)
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(user_id = %user_id, document_type = %request.document_type, "KYC submitted");

        self.notifications
            .notify(
                user_id,
                NotificationKind::Info,
                "KYC submitted",
                "Your identity documents were received and are awaiting verification.",
            )
            .await;

        Ok(user.into())
    }

    /// Latest applications and transactions, merged newest first
    pub async fn activity(
        &self,
        user_id: Uuid,
        query: ActivityQuery,
    ) -> Result<Vec<ActivityItem>, ApiError> {
        let limit = query.resolve();

        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;

        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;

        let items = applications
            .into_iter()
            .map(ActivityItem::from)
            .chain(transactions.into_iter().map(ActivityItem::from))
            .collect();

        Ok(merge_activity(items, limit as usize))
    }

    pub async fn list_users(
        &self,
        query: ListUsersQuery,
    ) -> Result<PaginatedResponse<User>, ApiError> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let items = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1 OR full_name ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR email ILIKE $1 OR full_name ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            items,
            total,
            page,
            limit,
        })
    }

    /// Verify or reject a pending KYC submission
    pub async fn review_kyc(
        &self,
        user_id: Uuid,
        decision: KycStatus,
        admin_id: Uuid,
    ) -> Result<UserResponse, ApiError> {
        if !matches!(decision, KycStatus::Verified | KycStatus::Rejected) {
            return Err(ApiError::BadRequest(
                "KYC decision must be VERIFIED or REJECTED".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET kyc_status = $1, updated_at = NOW()
            WHERE id = $2 AND kyc_status = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(decision)
        .bind(user_id)
        .bind(KycStatus::Pending)
        .fetch_optional(&self.db_pool)
        .await?;

        let user = match user {
            Some(user) => user,
            None => {
                // Distinguish a missing user from one with nothing to review
                self.find(user_id).await?;
                return Err(ApiError::Conflict(
                    "User has no pending KYC submission".to_string(),
                ));
            }
        };

        tracing::info!(user_id = %user_id, admin_id = %admin_id, decision = ?decision, "KYC reviewed");

        let (kind, title, message) = if decision == KycStatus::Verified {
            (
                NotificationKind::Success,
                "KYC verified",
                "Your identity has been verified.",
            )
        } else {
            (
                NotificationKind::Warning,
                "KYC rejected",
                "Your identity documents could not be verified. Please submit them again.",
            )
        };
        self.notifications.notify(user_id, kind, title, message).await;

        Ok(user.into())
    }

    pub async fn set_credit_score(
        &self,
        user_id: Uuid,
        credit_score: i32,
        admin_id: Uuid,
    ) -> Result<UserResponse, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET credit_score = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(credit_score)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %user_id, admin_id = %admin_id, credit_score, "Credit score set");
        Ok(user.into())
    }
}

fn count_applications(rows: &[(ApplicationStatus, i64)]) -> ApplicationCounts {
    rows.iter()
        .fold(ApplicationCounts::default(), |mut counts, (status, n)| {
            counts.total += n;
            match status {
                ApplicationStatus::Submitted => counts.submitted += n,
                ApplicationStatus::Review => counts.review += n,
                ApplicationStatus::Approved => counts.approved += n,
                ApplicationStatus::Rejected => counts.rejected += n,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_applications() {
        let counts = count_applications(&[
            (ApplicationStatus::Submitted, 2),
            (ApplicationStatus::Approved, 3),
            (ApplicationStatus::Rejected, 1),
        ]);
        assert_eq!(
            counts,
            ApplicationCounts {
                total: 6,
                submitted: 2,
                review: 0,
                approved: 3,
                rejected: 1,
            }
        );
    }
}
