//! Balance checks for repayments and withdrawals

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,

    #[error("Repayment amount exceeds remaining balance of {balance}")]
    ExceedsBalance { balance: Decimal },

    #[error("Withdrawal amount exceeds available funds of {available}")]
    ExceedsAvailable { available: Decimal },

    #[error("Amount cannot have more than 2 decimal places")]
    SubCentAmount,
}

/// Money columns hold cents, so anything finer would be rounded by the database
pub fn check_cents(amount: Decimal) -> Result<(), LedgerError> {
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::SubCentAmount);
    }
    Ok(())
}

/// What is still owed on a loan, never negative
pub fn outstanding_balance(total_repayment: Decimal, total_paid: Decimal) -> Decimal {
    (total_repayment - total_paid).max(Decimal::ZERO)
}

/// Balance left after paying `amount` against `balance`
pub fn apply_repayment(balance: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    check_cents(amount)?;
    if amount > balance {
        return Err(LedgerError::ExceedsBalance { balance });
    }
    Ok(balance - amount)
}

/// Disbursed funds not yet withdrawn or reserved by a pending withdrawal
pub fn withdrawable(principal: Decimal, withdrawn_or_pending: Decimal) -> Decimal {
    (principal - withdrawn_or_pending).max(Decimal::ZERO)
}

pub fn check_withdrawal(available: Decimal, amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    check_cents(amount)?;
    if amount > available {
        return Err(LedgerError::ExceedsAvailable { available });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_partial_and_final_repayment() {
        let balance = outstanding_balance(dec!(136000), dec!(100000));
        assert_eq!(balance, dec!(36000));

        assert_eq!(apply_repayment(balance, dec!(6000)), Ok(dec!(30000)));
        assert_eq!(apply_repayment(balance, dec!(36000)), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_overpayment_rejected() {
        assert_eq!(
            apply_repayment(dec!(100), dec!(100.01)),
            Err(LedgerError::ExceedsBalance {
                balance: dec!(100)
            })
        );
        assert_eq!(
            apply_repayment(dec!(100), Decimal::ZERO),
            Err(LedgerError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_overpaid_history_has_zero_balance() {
        assert_eq!(outstanding_balance(dec!(100), dec!(120)), Decimal::ZERO);
    }

    #[test]
    fn test_withdrawal_limits() {
        let available = withdrawable(dec!(30000), dec!(10000));
        assert_eq!(available, dec!(20000));
        assert!(check_withdrawal(available, dec!(20000)).is_ok());
        assert_eq!(
            check_withdrawal(available, dec!(20000.5)),
            Err(LedgerError::ExceedsAvailable {
                available: dec!(20000)
            })
        );
        assert_eq!(
            check_withdrawal(available, dec!(-1)),
            Err(LedgerError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_sub_cent_amounts_rejected() {
        // 99.999 against 100.00 would leave 0.001 owing, which rounds away in storage
        assert_eq!(
            apply_repayment(dec!(100.00), dec!(99.999)),
            Err(LedgerError::SubCentAmount)
        );
        assert_eq!(
            apply_repayment(dec!(100), dec!(0.001)),
            Err(LedgerError::SubCentAmount)
        );
        assert_eq!(
            check_withdrawal(dec!(500), dec!(10.005)),
            Err(LedgerError::SubCentAmount)
        );
    }

    #[test]
    fn test_trailing_zeros_are_whole_cents() {
        assert!(check_cents(dec!(12.500)).is_ok());
        assert!(check_cents(dec!(7)).is_ok());
        assert_eq!(apply_repayment(dec!(100.00), dec!(100.000)), Ok(Decimal::ZERO));
    }
}
