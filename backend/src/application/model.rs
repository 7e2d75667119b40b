use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::lending::{ApplicationStatus, ReviewReason};
use crate::loan::Loan;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub term_months: i32,
    pub purpose: Option<String>,
    pub status: ApplicationStatus,
    pub processing_fee_paid: bool,
    pub processing_progress: i32,
    pub progress_note: Option<String>,
    pub rejection_reason: Option<String>,
    pub auto_approved: bool,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ApplicationDocument {
    pub id: Uuid,
    pub application_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    #[serde(skip_serializing)]
    pub stored_path: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    pub amount: Decimal,
    #[validate(range(min = 1, message = "Term must be at least one month"))]
    pub term_months: i32,
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
}

/// Document upload carried as base64 inside JSON
#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
    #[validate(length(min = 1))]
    pub content_base64: String,
}

#[derive(Debug, Deserialize, Default, Validate)]
pub struct RejectApplicationRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub processing_progress: i32,
    #[validate(length(max = 500))]
    pub progress_note: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Application with its documents and, once created, its loan
#[derive(Debug, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<ApplicationDocument>,
    pub loan: Option<Loan>,
}

/// Result of submitting an application
#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    pub application: Application,
    pub auto_approved: bool,
    pub loan: Option<Loan>,
    pub review_reasons: Vec<ReviewReason>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_progress_range_is_validated() {
        let ok = UpdateProgressRequest {
            processing_progress: 100,
            progress_note: None,
        };
        assert!(ok.validate().is_ok());

        let too_high = UpdateProgressRequest {
            processing_progress: 101,
            progress_note: None,
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_zero_term_is_rejected() {
        let req = CreateApplicationRequest {
            amount: dec!(5000),
            term_months: 0,
            purpose: None,
        };
        assert!(req.validate().is_err());
    }
}
