//! Lending rule scenarios
//!
//! End-to-end walks through the pure lending rules: quoting a loan, deciding
//! whether it skips review, then paying it down and withdrawing against it.

use microlend_server::lending::{
    calculate, ledger, percentage, processing_fee, ApplicationStatus, ApprovalDecision,
    AutoApprovalPolicy, BorrowerProfile, LedgerError, LoanStatus, ReviewReason,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ============================================================================
// Quote Tests
// ============================================================================

#[test]
fn test_quote_matches_published_example() {
    let quote = calculate(dec!(100000), dec!(6), 6).unwrap().rounded();

    assert_eq!(quote.monthly_interest, dec!(6000));
    assert_eq!(quote.total_interest, dec!(36000));
    assert_eq!(quote.total_repayment, dec!(136000));
    assert_eq!(quote.monthly_installment, dec!(22666.67));
    assert_eq!(processing_fee(dec!(100000), dec!(2.5)), Ok(dec!(2500)));
}

#[test]
fn test_interest_grows_linearly_with_term() {
    let short = calculate(dec!(50000), dec!(4), 3).unwrap();
    let long = calculate(dec!(50000), dec!(4), 12).unwrap();

    assert_eq!(short.monthly_interest, long.monthly_interest);
    assert_eq!(long.total_interest, short.total_interest * dec!(4));
}

#[test]
fn test_installments_cover_total_repayment() {
    let quote = calculate(dec!(12345), dec!(3.5), 7).unwrap();
    let sum = quote.monthly_installment * Decimal::from(quote.term_months);
    assert_eq!(sum.round_dp(8), quote.total_repayment.round_dp(8));
}

// ============================================================================
// Auto-Approval Tests
// ============================================================================

#[test]
fn test_first_time_borrower_goes_to_review() {
    let decision = AutoApprovalPolicy::default().evaluate(
        &BorrowerProfile {
            credit_score: Some(800),
            prior_approved: 0,
            requested_amount: dec!(5000),
        },
        dec!(500000),
    );

    assert_eq!(
        decision,
        ApprovalDecision::ManualReview(vec![ReviewReason::InsufficientHistory])
    );
}

#[test]
fn test_every_failed_rule_is_reported() {
    let decision = AutoApprovalPolicy::default().evaluate(
        &BorrowerProfile {
            credit_score: None,
            prior_approved: 1,
            requested_amount: dec!(600000),
        },
        dec!(500000),
    );

    match decision {
        ApprovalDecision::ManualReview(reasons) => {
            assert!(reasons.contains(&ReviewReason::NoCreditScore));
            assert!(reasons.contains(&ReviewReason::AmountAboveAutoLimit));
            assert!(reasons.contains(&ReviewReason::AmountAbovePlatformMax));
            assert!(reasons.contains(&ReviewReason::InsufficientHistory));
        }
        ApprovalDecision::AutoApprove => panic!("expected manual review"),
    }
}

#[test]
fn test_boundary_values_are_accepted() {
    let policy = AutoApprovalPolicy::default();
    let decision = policy.evaluate(
        &BorrowerProfile {
            credit_score: Some(policy.min_credit_score),
            prior_approved: policy.min_prior_approved,
            requested_amount: policy.max_amount,
        },
        policy.max_amount,
    );
    assert!(decision.is_approved());
}

// ============================================================================
// Repayment and Withdrawal Tests
// ============================================================================

#[test]
fn test_loan_paid_down_to_zero() {
    let quote = calculate(dec!(100000), dec!(6), 6).unwrap().rounded();
    let mut balance = ledger::outstanding_balance(quote.total_repayment, Decimal::ZERO);
    let mut paid = Decimal::ZERO;

    for amount in [dec!(34000), dec!(34000), dec!(34000)] {
        balance = ledger::apply_repayment(balance, amount).unwrap();
        paid += amount;
    }
    assert_eq!(balance, dec!(34000));
    assert_eq!(percentage(paid, quote.total_repayment), dec!(75));

    assert_eq!(
        ledger::apply_repayment(balance, dec!(34000.01)),
        Err(LedgerError::ExceedsBalance { balance })
    );

    balance = ledger::apply_repayment(balance, dec!(34000)).unwrap();
    assert_eq!(balance, Decimal::ZERO);
    assert_eq!(percentage(quote.total_repayment, quote.total_repayment), dec!(100));
}

#[test]
fn test_withdrawals_cannot_exceed_principal() {
    let principal = dec!(100000);

    let available = ledger::withdrawable(principal, Decimal::ZERO);
    assert!(ledger::check_withdrawal(available, dec!(60000)).is_ok());

    let available = ledger::withdrawable(principal, dec!(60000));
    assert_eq!(available, dec!(40000));
    assert_eq!(
        ledger::check_withdrawal(available, dec!(50000)),
        Err(LedgerError::ExceedsAvailable { available })
    );
    assert_eq!(
        ledger::check_withdrawal(available, Decimal::ZERO),
        Err(LedgerError::NonPositiveAmount)
    );
}

// ============================================================================
// Status Machine Tests
// ============================================================================

#[test]
fn test_application_lifecycle() {
    use ApplicationStatus::*;

    assert!(Submitted.can_transition_to(Review));
    assert!(Review.can_transition_to(Approved));
    assert!(Submitted.can_transition_to(Rejected));
    assert!(!Approved.can_transition_to(Submitted));
    assert!(!Rejected.can_transition_to(Approved));
    assert!(Approved.is_final() && Rejected.is_final());
}

#[test]
fn test_loan_lifecycle() {
    use LoanStatus::*;

    assert!(PendingDisbursement.can_transition_to(Active));
    assert!(Active.can_transition_to(Completed));
    assert!(!PendingDisbursement.can_transition_to(Completed));
    assert!(!Completed.can_transition_to(Active));
}
