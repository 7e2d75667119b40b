use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::lending::{percentage, LoanStatus};
use crate::user::ApplicationCounts;

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct LoanCounts {
    pub pending_disbursement: i64,
    pub active: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct PendingWithdrawals {
    pub count: i64,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PlatformAnalytics {
    pub total_users: i64,
    pub applications: ApplicationCounts,
    /// Approved share of decided applications, in percent
    pub approval_rate: Decimal,
    pub loans: LoanCounts,
    pub total_disbursed: Decimal,
    pub total_repaid: Decimal,
    pub total_fees_collected: Decimal,
    pub pending_withdrawals: PendingWithdrawals,
}

#[derive(Clone)]
pub struct AnalyticsService {
    db_pool: PgPool,
}

impl AnalyticsService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn overview(&self) -> Result<PlatformAnalytics, ApiError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'USER'")
            .fetch_one(&self.db_pool)
            .await?;

        let applications = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'SUBMITTED'),
                   COUNT(*) FILTER (WHERE status = 'REVIEW'),
                   COUNT(*) FILTER (WHERE status = 'APPROVED'),
                   COUNT(*) FILTER (WHERE status = 'REJECTED')
            FROM applications
            "#,
        )
        .fetch_one(&self.db_pool)
        .await
        .map(|(total, submitted, review, approved, rejected)| ApplicationCounts {
            total,
            submitted,
            review,
            approved,
            rejected,
        })?;

        let loan_rows: Vec<(LoanStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM loans GROUP BY status")
                .fetch_all(&self.db_pool)
                .await?;
        let loans = count_loans(&loan_rows);

        let (total_disbursed, total_repaid, total_fees_collected) =
            sqlx::query_as::<_, (Decimal, Decimal, Decimal)>(
                r#"
                SELECT
                    COALESCE(SUM(amount) FILTER (WHERE kind = 'DISBURSEMENT' AND status = 'COMPLETED'), 0),
                    COALESCE(SUM(amount) FILTER (WHERE kind = 'REPAYMENT' AND status = 'COMPLETED'), 0),
                    COALESCE(SUM(amount) FILTER (WHERE kind = 'PROCESSING_FEE' AND status = 'COMPLETED'), 0)
                FROM transactions
                "#,
            )
            .fetch_one(&self.db_pool)
            .await?;

        let (count, amount) = sqlx::query_as::<_, (i64, Decimal)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM transactions
            WHERE kind = 'WITHDRAWAL' AND status = 'PENDING'
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;

        let decided = Decimal::from(applications.approved + applications.rejected);
        let approval_rate = percentage(Decimal::from(applications.approved), decided);

        Ok(PlatformAnalytics {
            total_users,
            applications,
            approval_rate,
            loans,
            total_disbursed,
            total_repaid,
            total_fees_collected,
            pending_withdrawals: PendingWithdrawals { count, amount },
        })
    }
}

fn count_loans(rows: &[(LoanStatus, i64)]) -> LoanCounts {
    let mut counts = LoanCounts::default();
    for (status, n) in rows {
        match status {
            LoanStatus::PendingDisbursement => counts.pending_disbursement += n,
            LoanStatus::Active => counts.active += n,
            LoanStatus::Completed => counts.completed += n,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_loans() {
        let counts = count_loans(&[(LoanStatus::Active, 4), (LoanStatus::Completed, 9)]);
        assert_eq!(
            counts,
            LoanCounts {
                pending_disbursement: 0,
                active: 4,
                completed: 9,
            }
        );
    }
}
