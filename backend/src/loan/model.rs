//! Loan domain models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::lending::{LoanStatus, TransactionStatus};

/// A loan created once the processing fee of an approved application is paid
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: Uuid,
    pub application_id: Uuid,
    pub user_id: Uuid,
    pub principal: Decimal,
    /// Monthly rate in percent, frozen at creation
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub monthly_interest: Decimal,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
    pub monthly_installment: Decimal,
    pub processing_fee: Decimal,
    pub status: LoanStatus,
    pub disbursed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Repayment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of money movement
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    ProcessingFee,
    Disbursement,
    Repayment,
    Withdrawal,
}

impl TransactionKind {
    /// Prefix used for human-readable references
    pub fn reference_prefix(self) -> &'static str {
        match self {
            TransactionKind::ProcessingFee => "FEE",
            TransactionKind::Disbursement => "DSB",
            TransactionKind::Repayment => "RPY",
            TransactionKind::Withdrawal => "WDR",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub loan_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub reference: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of fee recorded in `charges`
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "charge_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeKind {
    ProcessingFee,
}

/// Loan plus its repayment position
#[derive(Debug, Serialize, Clone)]
pub struct LoanOverview {
    #[serde(flatten)]
    pub loan: Loan,
    pub total_paid: Decimal,
    pub remaining_balance: Decimal,
    pub progress_percent: Decimal,
    pub available_to_withdraw: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RepayRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawRequest {
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Default, Validate)]
pub struct DecideWithdrawalRequest {
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RepaymentReceipt {
    pub repayment: Repayment,
    pub loan: Loan,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListLoansQuery {
    pub status: Option<LoanStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListWithdrawalsQuery {
    pub status: Option<TransactionStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
