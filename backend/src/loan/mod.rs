//! Loans and the money movements around them
//!
//! Processing fees, disbursement, repayments and withdrawals all write a
//! `Transaction` row so the borrower's activity feed and the admin analytics
//! read from one ledger.

pub mod model;
pub mod service;

pub use model::{
    ChargeKind, DecideWithdrawalRequest, ListLoansQuery, ListWithdrawalsQuery, Loan,
    LoanOverview, RepayRequest, Repayment, RepaymentReceipt, Transaction, TransactionKind,
    WithdrawRequest,
};
pub use service::LoanService;
