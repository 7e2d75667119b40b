//! Loan quote calculator
//!
//! Interest is simple interest on the original principal: every month accrues
//! `principal * rate / 100` regardless of repayments already made.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Calculator input errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("Principal must be greater than 0")]
    NonPositivePrincipal,

    #[error("Interest rate cannot be negative")]
    NegativeRate,

    #[error("Term must be at least one month")]
    ZeroTerm,

    #[error("Loan figures are too large to calculate")]
    Overflow,
}

/// Result of a loan calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Decimal,
    /// Monthly rate in percent (6.0 means 6% per month)
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub monthly_interest: Decimal,
    pub total_interest: Decimal,
    pub total_repayment: Decimal,
    pub monthly_installment: Decimal,
}

impl LoanQuote {
    /// Copy of the quote with every money field rounded to cents
    pub fn rounded(&self) -> Self {
        Self {
            monthly_interest: self.monthly_interest.round_dp(2),
            total_interest: self.total_interest.round_dp(2),
            total_repayment: self.total_repayment.round_dp(2),
            monthly_installment: self.monthly_installment.round_dp(2),
            ..*self
        }
    }
}

/// Compute a simple-interest quote for `principal` over `term_months`.
pub fn calculate(
    principal: Decimal,
    monthly_rate_percent: Decimal,
    term_months: i32,
) -> Result<LoanQuote, CalculatorError> {
    if principal <= Decimal::ZERO {
        return Err(CalculatorError::NonPositivePrincipal);
    }
    if monthly_rate_percent < Decimal::ZERO {
        return Err(CalculatorError::NegativeRate);
    }
    if term_months <= 0 {
        return Err(CalculatorError::ZeroTerm);
    }

    let months = Decimal::from(term_months);
    let monthly_interest = principal
        .checked_mul(monthly_rate_percent / HUNDRED)
        .ok_or(CalculatorError::Overflow)?;
    let total_interest = monthly_interest
        .checked_mul(months)
        .ok_or(CalculatorError::Overflow)?;
    let total_repayment = principal
        .checked_add(total_interest)
        .ok_or(CalculatorError::Overflow)?;
    let monthly_installment = total_repayment
        .checked_div(months)
        .ok_or(CalculatorError::Overflow)?;

    Ok(LoanQuote {
        principal,
        interest_rate: monthly_rate_percent,
        term_months,
        monthly_interest,
        total_interest,
        total_repayment,
        monthly_installment,
    })
}

/// Upfront processing fee charged on approval
pub fn processing_fee(amount: Decimal, fee_percent: Decimal) -> Result<Decimal, CalculatorError> {
    amount
        .checked_mul(fee_percent / HUNDRED)
        .map(|fee| fee.round_dp(2))
        .ok_or(CalculatorError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sample_scenario() {
        let quote = calculate(dec!(100000), dec!(6), 6).unwrap();

        assert_eq!(quote.monthly_interest, dec!(6000));
        assert_eq!(quote.total_interest, dec!(36000));
        assert_eq!(quote.total_repayment, dec!(136000));
        assert_eq!(quote.monthly_installment.round_dp(2), dec!(22666.67));
    }

    #[test]
    fn test_zero_rate() {
        let quote = calculate(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(quote.total_interest, Decimal::ZERO);
        assert_eq!(quote.monthly_installment, dec!(100));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(
            calculate(dec!(1000), dec!(5), 0),
            Err(CalculatorError::ZeroTerm)
        );
        assert_eq!(
            calculate(Decimal::ZERO, dec!(5), 3),
            Err(CalculatorError::NonPositivePrincipal)
        );
        assert_eq!(
            calculate(dec!(1000), dec!(-1), 3),
            Err(CalculatorError::NegativeRate)
        );
    }

    #[test]
    fn test_rounded_quote() {
        let quote = calculate(dec!(100000), dec!(6), 6).unwrap().rounded();
        assert_eq!(quote.monthly_installment, dec!(22666.67));
        assert_eq!(quote.total_repayment, dec!(136000));
    }

    #[test]
    fn test_processing_fee() {
        assert_eq!(processing_fee(dec!(30000), dec!(2.5)), Ok(dec!(750)));
        assert_eq!(processing_fee(dec!(333), dec!(3)), Ok(dec!(9.99)));
    }

    #[test]
    fn test_huge_inputs_overflow_instead_of_panicking() {
        assert_eq!(
            calculate(dec!(79228162514264337593543950), dec!(1000000), 1000),
            Err(CalculatorError::Overflow)
        );
        assert_eq!(
            calculate(Decimal::MAX, dec!(100), 1),
            Err(CalculatorError::Overflow)
        );
        assert_eq!(
            processing_fee(Decimal::MAX, dec!(200)),
            Err(CalculatorError::Overflow)
        );
    }
}
