//! Loan service layer: fee confirmation, disbursement, repayment and withdrawals

use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use super::model::{
    ChargeKind, ListLoansQuery, ListWithdrawalsQuery, Loan, LoanOverview, Repayment,
    RepaymentReceipt, Transaction, TransactionKind, WithdrawRequest,
};
use crate::application::Application;
use crate::error::ApiError;
use crate::lending::{
    calculate, ledger, percentage, processing_fee, ApplicationStatus, LoanStatus,
    TransactionStatus,
};
use crate::models::{PaginatedResponse, PaginationParams};
use crate::notification::{NotificationKind, NotificationService};
use crate::settings::{Settings, SettingsService};

/// Human-readable reference such as `RPY-7K2Q9X4BZD`
pub(crate) fn new_reference(kind: TransactionKind) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("{}-{}", kind.reference_prefix(), suffix.to_uppercase())
}

struct NewTransaction<'a> {
    user_id: Uuid,
    loan_id: Option<Uuid>,
    application_id: Option<Uuid>,
    kind: TransactionKind,
    amount: Decimal,
    status: TransactionStatus,
    reference: String,
    note: Option<&'a str>,
}

async fn insert_transaction(
    conn: &mut PgConnection,
    new: NewTransaction<'_>,
) -> Result<Transaction, ApiError> {
    let txn = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (id, user_id, loan_id, application_id, kind, amount, status, reference, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.loan_id)
    .bind(new.application_id)
    .bind(new.kind)
    .bind(new.amount)
    .bind(new.status)
    .bind(new.reference)
    .bind(new.note)
    .fetch_one(&mut *conn)
    .await?;
    Ok(txn)
}

/// Create the loan for an approved application together with its
/// processing-fee transaction and charge.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn open_loan(
    conn: &mut PgConnection,
    application: &Application,
    settings: &Settings,
) -> Result<Loan, ApiError> {
    let quote = calculate(
        application.amount,
        settings.interest_rate,
        application.term_months,
    )?
    .rounded();
    let fee = processing_fee(application.amount, settings.processing_fee_percent)?;

    let loan = sqlx::query_as::<_, Loan>(
        r#"
        INSERT INTO loans (
            id, application_id, user_id, principal, interest_rate, term_months,
            monthly_interest, total_interest, total_repayment, monthly_installment,
            processing_fee, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(application.id)
    .bind(application.user_id)
    .bind(quote.principal)
    .bind(quote.interest_rate)
    .bind(quote.term_months)
    .bind(quote.monthly_interest)
    .bind(quote.total_interest)
    .bind(quote.total_repayment)
    .bind(quote.monthly_installment)
    .bind(fee)
    .bind(LoanStatus::PendingDisbursement)
    .fetch_one(&mut *conn)
    .await?;

    insert_transaction(
        conn,
        NewTransaction {
            user_id: application.user_id,
            loan_id: Some(loan.id),
            application_id: Some(application.id),
            kind: TransactionKind::ProcessingFee,
            amount: fee,
            status: TransactionStatus::Completed,
            reference: new_reference(TransactionKind::ProcessingFee),
            note: None,
        },
    )
    .await?;

    sqlx::query(
        r#"
        INSERT INTO charges (id, user_id, application_id, loan_id, kind, amount, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(application.user_id)
    .bind(application.id)
    .bind(loan.id)
    .bind(ChargeKind::ProcessingFee)
    .bind(fee)
    .bind(format!(
        "Processing fee of {}% on {}",
        settings.processing_fee_percent, application.amount
    ))
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        loan_id = %loan.id,
        application_id = %application.id,
        principal = %loan.principal,
        total_repayment = %loan.total_repayment,
        "Loan opened"
    );

    Ok(loan)
}

async fn total_repaid<'e, E: PgExecutor<'e>>(executor: E, loan_id: Uuid) -> Result<Decimal, ApiError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        "SELECT COALESCE(SUM(amount), 0) FROM repayments WHERE loan_id = $1",
    )
    .bind(loan_id)
    .fetch_one(executor)
    .await?;
    Ok(total)
}

/// Withdrawals already made or still awaiting an admin decision
async fn reserved_withdrawals<'e, E: PgExecutor<'e>>(
    executor: E,
    loan_id: Uuid,
) -> Result<Decimal, ApiError> {
    let total = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(amount), 0) FROM transactions
        WHERE loan_id = $1 AND kind = 'WITHDRAWAL' AND status IN ('PENDING', 'COMPLETED')
        "#,
    )
    .bind(loan_id)
    .fetch_one(executor)
    .await?;
    Ok(total)
}

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    notifications: NotificationService,
}

impl LoanService {
    pub fn new(db_pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    /// Confirm the processing fee of an approved application and open its loan
    pub async fn confirm_processing_fee(
        &self,
        application_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Loan, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let application = sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE id = $1 FOR UPDATE",
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Application not found".to_string()))?;

        if application.status != ApplicationStatus::Approved {
            return Err(ApiError::Conflict(format!(
                "Application is {}, only approved applications can pay the processing fee",
                application.status.as_str()
            )));
        }

        let loan_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE application_id = $1)")
                .bind(application_id)
                .fetch_one(&mut *tx)
                .await?;

        if application.processing_fee_paid || loan_exists {
            return Err(ApiError::Conflict(
                "Processing fee has already been confirmed".to_string(),
            ));
        }

        let settings = SettingsService::load(&mut *tx).await?;
        let loan = open_loan(&mut *tx, &application, &settings).await?;

        sqlx::query(
            r#"
            UPDATE applications
            SET processing_fee_paid = TRUE, processing_progress = GREATEST(processing_progress, 75),
                progress_note = 'Processing fee received, awaiting disbursement', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            application_id = %application_id,
            loan_id = %loan.id,
            admin_id = %admin_id,
            fee = %loan.processing_fee,
            "Processing fee confirmed"
        );

        self.notifications
            .notify(
                loan.user_id,
                NotificationKind::Success,
                "Processing fee received",
                &format!(
                    "We received your processing fee of {}. Your loan of {} is being prepared for disbursement.",
                    loan.processing_fee, loan.principal
                ),
            )
            .await;

        Ok(loan)
    }

    /// Move a loan from `PENDING_DISBURSEMENT` to `ACTIVE`
    pub async fn disburse_loan(&self, loan_id: Uuid, admin_id: Uuid) -> Result<Loan, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        if !loan.status.can_transition_to(LoanStatus::Active) {
            return Err(ApiError::Conflict(format!(
                "Loan is {} and cannot be disbursed",
                loan.status.as_str()
            )));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1, disbursed_at = NOW(), updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Active)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_transaction(
            &mut *tx,
            NewTransaction {
                user_id: loan.user_id,
                loan_id: Some(loan.id),
                application_id: Some(loan.application_id),
                kind: TransactionKind::Disbursement,
                amount: loan.principal,
                status: TransactionStatus::Completed,
                reference: new_reference(TransactionKind::Disbursement),
                note: None,
            },
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE applications
            SET processing_progress = 100, progress_note = 'Loan disbursed', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loan.application_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = %loan.id, admin_id = %admin_id, principal = %loan.principal, "Loan disbursed");

        self.notifications
            .notify(
                loan.user_id,
                NotificationKind::Success,
                "Loan disbursed",
                &format!(
                    "Your loan of {} has been disbursed. Your monthly installment is {}.",
                    loan.principal, loan.monthly_installment
                ),
            )
            .await;

        Ok(loan)
    }

    /// Most recent loan that is pending disbursement or active
    pub async fn active_loan(&self, user_id: Uuid) -> Result<Option<LoanOverview>, ApiError> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1 AND status IN ('PENDING_DISBURSEMENT', 'ACTIVE')
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?;

        match loan {
            Some(loan) => Ok(Some(self.overview(loan).await?)),
            None => Ok(None),
        }
    }

    pub async fn overview(&self, loan: Loan) -> Result<LoanOverview, ApiError> {
        let total_paid = total_repaid(&self.db_pool, loan.id).await?;
        let available_to_withdraw = if loan.status == LoanStatus::Active {
            let reserved = reserved_withdrawals(&self.db_pool, loan.id).await?;
            ledger::withdrawable(loan.principal, reserved)
        } else {
            Decimal::ZERO
        };

        Ok(LoanOverview {
            remaining_balance: ledger::outstanding_balance(loan.total_repayment, total_paid),
            progress_percent: percentage(total_paid, loan.total_repayment),
            total_paid,
            available_to_withdraw,
            loan,
        })
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Loan>, ApiError> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(loans)
    }

    pub async fn loan_for_application(&self, application_id: Uuid) -> Result<Option<Loan>, ApiError> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE application_id = $1")
            .bind(application_id)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(loan)
    }

    /// Repayment history of one of the caller's loans, newest first
    pub async fn repayments(&self, user_id: Uuid, loan_id: Uuid) -> Result<Vec<Repayment>, ApiError> {
        let owned: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE id = $1 AND user_id = $2)")
                .bind(loan_id)
                .bind(user_id)
                .fetch_one(&self.db_pool)
                .await?;
        if !owned {
            return Err(ApiError::NotFound("Loan not found".to_string()));
        }

        let repayments = sqlx::query_as::<_, Repayment>(
            "SELECT * FROM repayments WHERE loan_id = $1 ORDER BY created_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(repayments)
    }

    /// Record a repayment against an active loan owned by `user_id`.
    ///
    /// The loan row stays locked until commit so two concurrent repayments
    /// see each other's effect on the balance.
    pub async fn repay(
        &self,
        user_id: Uuid,
        loan_id: Uuid,
        amount: Decimal,
    ) -> Result<RepaymentReceipt, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(loan_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        if loan.status != LoanStatus::Active {
            return Err(ApiError::BadRequest(format!(
                "Loan is {}, only active loans can be repaid",
                loan.status.as_str()
            )));
        }

        let paid = total_repaid(&mut *tx, loan.id).await?;
        let balance = ledger::outstanding_balance(loan.total_repayment, paid);
        let remaining = ledger::apply_repayment(balance, amount)?;
        let reference = new_reference(TransactionKind::Repayment);

        let repayment = sqlx::query_as::<_, Repayment>(
            r#"
            INSERT INTO repayments (id, loan_id, user_id, amount, remaining_balance, reference)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan.id)
        .bind(user_id)
        .bind(amount)
        .bind(remaining)
        .bind(&reference)
        .fetch_one(&mut *tx)
        .await?;

        insert_transaction(
            &mut *tx,
            NewTransaction {
                user_id,
                loan_id: Some(loan.id),
                application_id: Some(loan.application_id),
                kind: TransactionKind::Repayment,
                amount,
                status: TransactionStatus::Completed,
                reference,
                note: None,
            },
        )
        .await?;

        let loan = if remaining.is_zero() && loan.status.can_transition_to(LoanStatus::Completed) {
            sqlx::query_as::<_, Loan>(
                r#"
                UPDATE loans
                SET status = $1, completed_at = NOW(), updated_at = NOW()
                WHERE id = $2
                RETURNING *
                "#,
            )
            .bind(LoanStatus::Completed)
            .bind(loan.id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            loan
        };

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan.id,
            user_id = %user_id,
            amount = %amount,
            remaining = %remaining,
            "Repayment recorded"
        );

        let (title, message) = if loan.status == LoanStatus::Completed {
            (
                "Loan fully repaid",
                format!("Your final repayment of {amount} was received. Your loan is now complete."),
            )
        } else {
            (
                "Repayment received",
                format!("We received your repayment of {amount}. Remaining balance: {remaining}."),
            )
        };
        self.notifications
            .notify(user_id, NotificationKind::Success, title, &message)
            .await;

        Ok(RepaymentReceipt { repayment, loan })
    }

    /// Request a withdrawal from the caller's active loan
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
        request: WithdrawRequest,
    ) -> Result<Transaction, ApiError> {
        let mut tx = self.db_pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1 AND status = 'ACTIVE'
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::BadRequest("You have no active loan to withdraw from".to_string()))?;

        let reserved = reserved_withdrawals(&mut *tx, loan.id).await?;
        let available = ledger::withdrawable(loan.principal, reserved);
        ledger::check_withdrawal(available, request.amount)?;

        let withdrawal = insert_transaction(
            &mut *tx,
            NewTransaction {
                user_id,
                loan_id: Some(loan.id),
                application_id: Some(loan.application_id),
                kind: TransactionKind::Withdrawal,
                amount: request.amount,
                status: TransactionStatus::Pending,
                reference: new_reference(TransactionKind::Withdrawal),
                note: request.note.as_deref(),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %withdrawal.id,
            loan_id = %loan.id,
            amount = %withdrawal.amount,
            "Withdrawal requested"
        );

        self.notifications
            .notify(
                user_id,
                NotificationKind::Info,
                "Withdrawal requested",
                &format!(
                    "Your withdrawal of {} ({}) is awaiting approval.",
                    withdrawal.amount, withdrawal.reference
                ),
            )
            .await;

        Ok(withdrawal)
    }

    pub async fn list_withdrawals(
        &self,
        query: ListWithdrawalsQuery,
    ) -> Result<PaginatedResponse<Transaction>, ApiError> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();

        let items = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE kind = 'WITHDRAWAL' AND ($1::transaction_status IS NULL OR status = $1)
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
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE kind = 'WITHDRAWAL' AND ($1::transaction_status IS NULL OR status = $1)
            "#,
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

    /// Approve (`COMPLETED`) or reject (`REJECTED`) a pending withdrawal
    pub async fn decide_withdrawal(
        &self,
        transaction_id: Uuid,
        approve: bool,
        admin_id: Uuid,
        note: Option<String>,
    ) -> Result<Transaction, ApiError> {
        let next = if approve {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Rejected
        };

        let mut tx = self.db_pool.begin().await?;

        let current = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE id = $1 AND kind = 'WITHDRAWAL' FOR UPDATE",
        )
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Withdrawal not found".to_string()))?;

        if !current.status.can_transition_to(next) {
            return Err(ApiError::Conflict(
                "Withdrawal has already been processed".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET status = $1, note = COALESCE($2, note), updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(next)
        .bind(note)
        .bind(transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %updated.id,
            admin_id = %admin_id,
            approved = approve,
            "Withdrawal decided"
        );

        let (kind, title, message) = if approve {
            (
                NotificationKind::Success,
                "Withdrawal approved",
                format!("Your withdrawal of {} has been approved.", updated.amount),
            )
        } else {
            (
                NotificationKind::Warning,
                "Withdrawal rejected",
                format!("Your withdrawal of {} was rejected.", updated.amount),
            )
        };
        self.notifications
            .notify(updated.user_id, kind, title, &message)
            .await;

        Ok(updated)
    }

    pub async fn admin_list(
        &self,
        query: ListLoansQuery,
    ) -> Result<PaginatedResponse<Loan>, ApiError> {
        let pagination = PaginationParams {
            page: query.page,
            limit: query.limit,
        };
        let (page, limit) = pagination.resolve();

        let items = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ($1::loan_status IS NULL OR status = $1)
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
            "SELECT COUNT(*) FROM loans WHERE ($1::loan_status IS NULL OR status = $1)",
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let reference = new_reference(TransactionKind::Repayment);
        assert!(reference.starts_with("RPY-"));
        assert_eq!(reference.len(), 14);
        assert!(reference[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_references_differ() {
        assert_ne!(
            new_reference(TransactionKind::Withdrawal),
            new_reference(TransactionKind::Withdrawal)
        );
    }
}
