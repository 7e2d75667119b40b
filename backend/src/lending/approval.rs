//! Auto-approval rule evaluator
//!
//! An application skips manual review only when the borrower has a good
//! credit score, a track record of approved applications, and asks for an
//! amount inside both the auto-approval ceiling and the platform maximum.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Thresholds for auto-approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoApprovalPolicy {
    pub min_credit_score: i32,
    pub max_amount: Decimal,
    pub min_prior_approved: i64,
}

impl Default for AutoApprovalPolicy {
    fn default() -> Self {
        Self {
            min_credit_score: 650,
            max_amount: dec!(100000),
            min_prior_approved: 3,
        }
    }
}

/// Borrower attributes the evaluator looks at
#[derive(Debug, Clone, Copy)]
pub struct BorrowerProfile {
    pub credit_score: Option<i32>,
    pub prior_approved: i64,
    pub requested_amount: Decimal,
}

/// Why an application was routed to a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    NoCreditScore,
    CreditScoreTooLow,
    AmountAboveAutoLimit,
    AmountAbovePlatformMax,
    InsufficientHistory,
}

/// Outcome of the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    AutoApprove,
    ManualReview(Vec<ReviewReason>),
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalDecision::AutoApprove)
    }
}

impl AutoApprovalPolicy {
    /// Evaluate a borrower against the policy and the platform `max_loan`.
    pub fn evaluate(&self, profile: &BorrowerProfile, max_loan: Decimal) -> ApprovalDecision {
        let mut reasons = Vec::new();

        match profile.credit_score {
            None => reasons.push(ReviewReason::NoCreditScore),
            Some(score) if score < self.min_credit_score => {
                reasons.push(ReviewReason::CreditScoreTooLow)
            }
            Some(_) => {}
        }

        if profile.requested_amount > self.max_amount {
            reasons.push(ReviewReason::AmountAboveAutoLimit);
        }
        if profile.requested_amount > max_loan {
            reasons.push(ReviewReason::AmountAbovePlatformMax);
        }
        if profile.prior_approved < self.min_prior_approved {
            reasons.push(ReviewReason::InsufficientHistory);
        }

        if reasons.is_empty() {
            ApprovalDecision::AutoApprove
        } else {
            ApprovalDecision::ManualReview(reasons)
        }
    }
}
