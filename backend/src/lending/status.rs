//! Status enums and their allowed transitions

use serde::{Deserialize, Serialize};

/// Application status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    Review,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Submitted, Review)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Review, Approved)
                | (Review, Rejected)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::Review => "REVIEW",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

/// Loan status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    PendingDisbursement,
    Active,
    Completed,
}

impl LoanStatus {
    /// Loans only move forward, one step at a time.
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::PendingDisbursement, LoanStatus::Active)
                | (LoanStatus::Active, LoanStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::PendingDisbursement => "PENDING_DISBURSEMENT",
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Completed => "COMPLETED",
        }
    }
}

/// Money-movement status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "transaction_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Rejected,
}

impl TransactionStatus {
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Completed)
                | (TransactionStatus::Pending, TransactionStatus::Rejected)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Rejected => "REJECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_transitions() {
        use ApplicationStatus::*;
        assert!(Submitted.can_transition_to(Review));
        assert!(Submitted.can_transition_to(Approved));
        assert!(Review.can_transition_to(Rejected));
        assert!(!Review.can_transition_to(Submitted));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(Approved.is_final());
        assert!(!Review.is_final());
    }

    #[test]
    fn test_loan_never_goes_backwards() {
        use LoanStatus::*;
        let all = [PendingDisbursement, Active, Completed];
        for from in all {
            for to in all {
                let expected = matches!(
                    (from, to),
                    (PendingDisbursement, Active) | (Active, Completed)
                );
                assert_eq!(from.can_transition_to(to), expected, "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_transaction_transitions() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Completed));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Rejected));
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Rejected));
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_string(&LoanStatus::PendingDisbursement).unwrap(),
            "\"PENDING_DISBURSEMENT\""
        );
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Review).unwrap(),
            "\"REVIEW\""
        );
        assert_eq!(LoanStatus::Active.as_str(), "ACTIVE");
    }
}
