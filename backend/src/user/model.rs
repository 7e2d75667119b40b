use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::Application;
use crate::loan::{LoanOverview, Transaction, TransactionKind};
use crate::models::{KycStatus, UserResponse};

#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 120))]
    pub full_name: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitKycRequest {
    #[validate(length(min = 2, max = 50))]
    pub document_type: String,
    #[validate(length(min = 3, max = 64))]
    pub document_number: String,
}

/// Admin decision on a pending KYC submission
#[derive(Debug, Deserialize)]
pub struct ReviewKycRequest {
    pub status: KycStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetCreditScoreRequest {
    #[validate(range(min = 0, max = 1000, message = "Credit score must be between 0 and 1000"))]
    pub credit_score: i32,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListUsersQuery {
    /// Case-insensitive match on email or name
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

impl ActivityQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn resolve(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ApplicationCounts {
    pub total: i64,
    pub submitted: i64,
    pub review: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: UserResponse,
    pub active_loan: Option<LoanOverview>,
    pub applications: ApplicationCounts,
    pub total_repaid: Decimal,
    pub unread_notifications: i64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivitySource {
    Application,
    Transaction,
}

/// One entry of the borrower's activity timeline
#[derive(Debug, Serialize, Clone)]
pub struct ActivityItem {
    pub id: Uuid,
    pub source: ActivitySource,
    pub title: String,
    pub amount: Decimal,
    pub status: String,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Application> for ActivityItem {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            source: ActivitySource::Application,
            title: format!("Loan application for {} months", app.term_months),
            amount: app.amount,
            status: app.status.as_str().to_string(),
            reference: None,
            created_at: app.created_at,
        }
    }
}

impl From<Transaction> for ActivityItem {
    fn from(txn: Transaction) -> Self {
        let title = match txn.kind {
            TransactionKind::ProcessingFee => "Processing fee",
            TransactionKind::Disbursement => "Loan disbursement",
            TransactionKind::Repayment => "Repayment",
            TransactionKind::Withdrawal => "Withdrawal",
        };
        Self {
            id: txn.id,
            source: ActivitySource::Transaction,
            title: title.to_string(),
            amount: txn.amount,
            status: txn.status.as_str().to_string(),
            reference: Some(txn.reference),
            created_at: txn.created_at,
        }
    }
}

/// Newest first, at most `limit` entries
pub fn merge_activity(mut items: Vec<ActivityItem>, limit: usize) -> Vec<ActivityItem> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(limit);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn item(source: ActivitySource, minutes_ago: i64) -> ActivityItem {
        ActivityItem {
            id: Uuid::new_v4(),
            source,
            title: "entry".to_string(),
            amount: dec!(100),
            status: "COMPLETED".to_string(),
            reference: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_merge_orders_newest_first_and_truncates() {
        let items = vec![
            item(ActivitySource::Application, 30),
            item(ActivitySource::Transaction, 5),
            item(ActivitySource::Transaction, 60),
            item(ActivitySource::Application, 1),
        ];

        let merged = merge_activity(items, 3);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].created_at > merged[1].created_at);
        assert!(merged[1].created_at > merged[2].created_at);
        assert_eq!(merged[0].source, ActivitySource::Application);
    }

    #[test]
    fn test_activity_limit_is_clamped() {
        assert_eq!(ActivityQuery::default().resolve(), 20);
        assert_eq!(ActivityQuery { limit: Some(0) }.resolve(), 1);
        assert_eq!(ActivityQuery { limit: Some(500) }.resolve(), 100);
    }

    #[test]
    fn test_credit_score_bounds() {
        assert!(SetCreditScoreRequest { credit_score: 1000 }.validate().is_ok());
        assert!(SetCreditScoreRequest { credit_score: -1 }.validate().is_err());
    }
}
