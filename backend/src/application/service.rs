//! Application service: submission with auto-approval, documents and review

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::model::{
    Application, ApplicationDetail, ApplicationDocument, CreateApplicationRequest,
    ListApplicationsQuery, SubmissionOutcome, UpdateProgressRequest, UploadDocumentRequest,
};
use crate::error::ApiError;
use crate::lending::{
    calculate, processing_fee, ApplicationStatus, ApprovalDecision, AutoApprovalPolicy,
    BorrowerProfile,
};
use crate::loan::{service::open_loan, LoanService};
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notification::{NotificationKind, NotificationService};
use crate::settings::SettingsService;

/// Keep only characters that are safe in a file name
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lock an application and move it to `next`, or fail with 409.
async fn transition(
    conn: &mut PgConnection,
    id: Uuid,
    next: ApplicationStatus,
    reviewer: Option<Uuid>,
) -> Result<Application, ApiError> {
    let current =
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

    if current.status.is_final() {
        return Err(ApiError::Conflict(format!(
            "Application is already {} and cannot change",
            current.status.as_str()
        )));
    }
    if !current.status.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Application cannot move from {} to {}",
            current.status.as_str(),
            next.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications
        SET status = $1, reviewed_by = COALESCE($2, reviewed_by),
            reviewed_at = CASE WHEN $2::uuid IS NULL THEN reviewed_at ELSE NOW() END,
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(next)
    .bind(reviewer)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(updated)
}

#[derive(Clone)]
pub struct ApplicationService {
    db_pool: PgPool,
    settings: SettingsService,
    loans: LoanService,
    notifications: NotificationService,
    policy: AutoApprovalPolicy,
    upload_dir: PathBuf,
    max_upload_bytes: usize,
}

impl ApplicationService {
    pub fn new(
        db_pool: PgPool,
        loans: LoanService,
        notifications: NotificationService,
        upload_dir: PathBuf,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            settings: SettingsService::new(db_pool.clone()),
            db_pool,
            loans,
            notifications,
            policy: AutoApprovalPolicy::default(),
            upload_dir,
            max_upload_bytes,
        }
    }

    async fn prior_approved(&self, user_id: Uuid) -> Result<i64, ApiError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE user_id = $1 AND status = 'APPROVED'",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(count)
    }

    /// Submit an application and run auto-approval when it is enabled.
    ///
    /// An auto-approved application, its loan, fee transaction and charge
    /// are written in one database transaction.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request: CreateApplicationRequest,
    ) -> Result<SubmissionOutcome, ApiError> {
        let settings = self.settings.get().await?;
        settings.check_loan_request(request.amount, request.term_months)?;
        let quote = calculate(request.amount, settings.interest_rate, request.term_months)?;

        let decision = if settings.auto_approval_enabled {
            let credit_score: Option<i32> =
                sqlx::query_scalar("SELECT credit_score FROM users WHERE id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.db_pool)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

            let profile = BorrowerProfile {
                credit_score,
                prior_approved: self.prior_approved(user_id).await?,
                requested_amount: request.amount,
            };
            Some(self.policy.evaluate(&profile, settings.max_loan))
        } else {
            None
        };

        let mut tx = self.db_pool.begin().await?;

        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (id, user_id, amount, term_months, purpose, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.amount)
        .bind(request.term_months)
        .bind(request.purpose.as_deref())
        .bind(ApplicationStatus::Submitted)
        .fetch_one(&mut *tx)
        .await?;

        let (application, loan, review_reasons) = match decision {
            Some(ApprovalDecision::AutoApprove) => {
                let approved = transition(&mut *tx, application.id, ApplicationStatus::Approved, None)
                    .await?;
                let approved = sqlx::query_as::<_, Application>(
                    r#"
                    UPDATE applications
                    SET auto_approved = TRUE, processing_fee_paid = TRUE, processing_progress = 100,
                        progress_note = 'Automatically approved', updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(approved.id)
                .fetch_one(&mut *tx)
                .await?;
                let loan = open_loan(&mut *tx, &approved, &settings).await?;
                (approved, Some(loan), Vec::new())
            }
            Some(ApprovalDecision::ManualReview(reasons)) => (application, None, reasons),
            None => (application, None, Vec::new()),
        };

        tx.commit().await?;

        let auto_approved = application.auto_approved;
        tracing::info!(
            application_id = %application.id,
            user_id = %user_id,
            amount = %application.amount,
            term_months = application.term_months,
            auto_approved,
            review_reasons = ?review_reasons,
            "Application submitted"
        );

        if auto_approved {
            self.notifications
                .notify(
                    user_id,
                    NotificationKind::Success,
                    "Application approved",
                    &format!(
                        "Your application for {} was approved automatically. Total repayment: {} over {} months.",
                        application.amount,
                        quote.rounded().total_repayment,
                        application.term_months
                    ),
                )
                .await;
        } else {
            self.notifications
                .notify(
                    user_id,
                    NotificationKind::Info,
                    "Application received",
                    &format!(
                        "Your application for {} has been received and is awaiting review.",
                        application.amount
                    ),
                )
                .await;
        }

        Ok(SubmissionOutcome {
            application,
            auto_approved,
            loan,
            review_reasons,
        })
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Application>, ApiError> {
        let applications = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(applications)
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> Result<Application, ApiError> {
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))
    }

    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<ApplicationDetail, ApiError> {
        let application = self.find_owned(user_id, id).await?;

        let documents = sqlx::query_as::<_, ApplicationDocument>(
            "SELECT * FROM application_documents WHERE application_id = $1 ORDER BY created_at",
        )
        .bind(id)
        .fetch_all(&self.db_pool)
        .await?;

        let loan = self.loans.loan_for_application(id).await?;

        Ok(ApplicationDetail {
            application,
            documents,
            loan,
        })
    }

    /// Store a base64 document under `<upload_dir>/<application_id>/`
    pub async fn upload_document(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        request: UploadDocumentRequest,
    ) -> Result<ApplicationDocument, ApiError> {
        let application = self.find_owned(user_id, application_id).await?;
        if application.status == ApplicationStatus::Rejected {
            return Err(ApiError::Conflict(
                "Documents cannot be added to a rejected application".to_string(),
            ));
        }

        let bytes = STANDARD
            .decode(request.content_base64.trim())
            .map_err(|_| ApiError::BadRequest("Document content is not valid base64".to_string()))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Document is empty".to_string()));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(ApiError::BadRequest(format!(
                "Document exceeds the {} byte limit",
                self.max_upload_bytes
            )));
        }

        let id = Uuid::new_v4();
        let dir = self.upload_dir.join(application_id.to_string());
        let path = dir.join(format!("{}-{}", id, sanitize_file_name(&request.file_name)));
        write_file(&dir, &path, &bytes).await?;

        let document = sqlx::query_as::<_, ApplicationDocument>(
            r#"
            INSERT INTO application_documents (id, application_id, file_name, content_type, stored_path, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(application_id)
        .bind(&request.file_name)
        .bind(&request.content_type)
        .bind(path.to_string_lossy().into_owned())
        .bind(bytes.len() as i64)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            application_id = %application_id,
            document_id = %document.id,
            size_bytes = document.size_bytes,
            "Application document stored"
        );

        Ok(document)
    }

    pub async fn admin_list(
        &self,
        query: ListApplicationsQuery,
    ) -> Result<PaginatedResponse<Application>, ApiError> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();

        let items = sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE ($1::application_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(query.status)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM applications WHERE ($1::application_status IS NULL OR status = $1)",
        )
        .bind(query.status)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            items,
            total,
            page,
            limit,
        })
    }

    /// `SUBMITTED -> REVIEW`
    pub async fn mark_review(&self, id: Uuid, admin_id: Uuid) -> Result<Application, ApiError> {
        let mut tx = self.db_pool.begin().await?;
        let application = transition(&mut *tx, id, ApplicationStatus::Review, Some(admin_id)).await?;
        tx.commit().await?;

        tracing::info!(application_id = %id, admin_id = %admin_id, "Application moved to review");

        self.notifications
            .notify(
                application.user_id,
                NotificationKind::Info,
                "Application under review",
                "Your application is being reviewed by our team.",
            )
            .await;

        Ok(application)
    }

    pub async fn approve(&self, id: Uuid, admin_id: Uuid) -> Result<Application, ApiError> {
        let settings = self.settings.get().await?;

        let mut tx = self.db_pool.begin().await?;
        let approved = transition(&mut *tx, id, ApplicationStatus::Approved, Some(admin_id)).await?;
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET processing_progress = GREATEST(processing_progress, 50),
                progress_note = 'Approved, awaiting processing fee', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(approved.id)
        .fetch_one(&mut *tx)
        .await?;
        let fee = processing_fee(application.amount, settings.processing_fee_percent)?;
        tx.commit().await?;

        tracing::info!(application_id = %id, admin_id = %admin_id, "Application approved");

        self.notifications
            .notify(
                application.user_id,
                NotificationKind::Success,
                "Application approved",
                &format!(
                    "Your application for {} was approved. Pay the processing fee of {} to continue.",
                    application.amount, fee
                ),
            )
            .await;

        Ok(application)
    }

    pub async fn reject(
        &self,
        id: Uuid,
        admin_id: Uuid,
        reason: Option<String>,
    ) -> Result<Application, ApiError> {
        let mut tx = self.db_pool.begin().await?;
        let rejected = transition(&mut *tx, id, ApplicationStatus::Rejected, Some(admin_id)).await?;
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET rejection_reason = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(reason.as_deref())
        .bind(rejected.id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %id, admin_id = %admin_id, "Application rejected");

        let message = match &application.rejection_reason {
            Some(reason) => format!("Your application was not approved: {reason}"),
            None => "Your application was not approved.".to_string(),
        };
        self.notifications
            .notify(
                application.user_id,
                NotificationKind::Warning,
                "Application rejected",
                &message,
            )
            .await;

        Ok(application)
    }

    pub async fn update_progress(
        &self,
        id: Uuid,
        request: UpdateProgressRequest,
    ) -> Result<Application, ApiError> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET processing_progress = $1, progress_note = COALESCE($2, progress_note), updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(request.processing_progress)
        .bind(request.progress_note.as_deref())
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

        tracing::debug!(
            application_id = %id,
            progress = application.processing_progress,
            "Application progress updated"
        );

        Ok(application)
    }
}

async fn write_file(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to create upload directory: {e}")))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to store document: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("payslip march.pdf"), "payslip_march.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("..."), "document");
        assert_eq!(sanitize_file_name("id-card_2.png"), "id-card_2.png");
    }
}
