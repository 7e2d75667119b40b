//! Lending rules for MicroLend
//!
//! Pure, database-free logic shared by the application and loan services:
//! - Simple-interest loan quotes
//! - Auto-approval evaluation
//! - Repayment and withdrawal balance checks
//! - Status state machines for applications, loans and transactions
//! - Progress percentages

pub mod approval;
pub mod calculator;
pub mod ledger;
pub mod progress;
pub mod status;

pub use approval::{ApprovalDecision, AutoApprovalPolicy, BorrowerProfile, ReviewReason};
pub use calculator::{calculate, processing_fee, CalculatorError, LoanQuote};
pub use ledger::LedgerError;
pub use progress::percentage;
pub use status::{ApplicationStatus, LoanStatus, TransactionStatus};
