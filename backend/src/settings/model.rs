use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::lending::ledger;

/// Tunable platform parameters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settings {
    /// Monthly interest rate in percent
    pub interest_rate: Decimal,
    pub processing_fee_percent: Decimal,
    pub min_loan: Decimal,
    pub max_loan: Decimal,
    pub max_months: i32,
    pub auto_approval_enabled: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Settings visible to anonymous visitors
#[derive(Debug, Clone, Serialize)]
pub struct PublicSettings {
    pub interest_rate: Decimal,
    pub processing_fee_percent: Decimal,
    pub min_loan: Decimal,
    pub max_loan: Decimal,
    pub max_months: i32,
}

impl From<Settings> for PublicSettings {
    fn from(s: Settings) -> Self {
        Self {
            interest_rate: s.interest_rate,
            processing_fee_percent: s.processing_fee_percent,
            min_loan: s.min_loan,
            max_loan: s.max_loan,
            max_months: s.max_months,
        }
    }
}

impl Settings {
    /// Check a requested amount and term against the platform limits
    pub fn check_loan_request(&self, amount: Decimal, term_months: i32) -> Result<(), ApiError> {
        ledger::check_cents(amount)?;
        if amount < self.min_loan || amount > self.max_loan {
            return Err(ApiError::BadRequest(format!(
                "Loan amount must be between {} and {}",
                self.min_loan, self.max_loan
            )));
        }
        if term_months < 1 || term_months > self.max_months {
            return Err(ApiError::BadRequest(format!(
                "Loan term must be between 1 and {} months",
                self.max_months
            )));
        }
        Ok(())
    }
}

/// Partial settings update; absent fields keep their value
#[derive(Debug, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    pub interest_rate: Option<Decimal>,
    pub processing_fee_percent: Option<Decimal>,
    pub min_loan: Option<Decimal>,
    pub max_loan: Option<Decimal>,
    pub max_months: Option<i32>,
    pub auto_approval_enabled: Option<bool>,
}

impl UpdateSettingsRequest {
    /// Merge onto `current` and validate the result
    pub fn apply(&self, current: &Settings) -> Result<Settings, ApiError> {
        let merged = Settings {
            interest_rate: self.interest_rate.unwrap_or(current.interest_rate),
            processing_fee_percent: self
                .processing_fee_percent
                .unwrap_or(current.processing_fee_percent),
            min_loan: self.min_loan.unwrap_or(current.min_loan),
            max_loan: self.max_loan.unwrap_or(current.max_loan),
            max_months: self.max_months.unwrap_or(current.max_months),
            auto_approval_enabled: self
                .auto_approval_enabled
                .unwrap_or(current.auto_approval_enabled),
            updated_by: current.updated_by,
            updated_at: current.updated_at,
        };

        if merged.interest_rate < Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "Interest rate cannot be negative".to_string(),
            ));
        }
        if merged.processing_fee_percent < Decimal::ZERO
            || merged.processing_fee_percent > Decimal::ONE_HUNDRED
        {
            return Err(ApiError::ValidationError(
                "Processing fee must be between 0 and 100 percent".to_string(),
            ));
        }
        if merged.min_loan <= Decimal::ZERO {
            return Err(ApiError::ValidationError(
                "Minimum loan must be greater than 0".to_string(),
            ));
        }
        if merged.min_loan > merged.max_loan {
            return Err(ApiError::ValidationError(
                "Minimum loan cannot exceed maximum loan".to_string(),
            ));
        }
        if merged.max_months < 1 {
            return Err(ApiError::ValidationError(
                "Maximum term must be at least one month".to_string(),
            ));
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn defaults() -> Settings {
        Settings {
            interest_rate: dec!(6),
            processing_fee_percent: dec!(2.5),
            min_loan: dec!(1000),
            max_loan: dec!(500000),
            max_months: 12,
            auto_approval_enabled: true,
            updated_by: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let update = UpdateSettingsRequest {
            interest_rate: Some(dec!(5.5)),
            ..Default::default()
        };
        let merged = update.apply(&defaults()).unwrap();
        assert_eq!(merged.interest_rate, dec!(5.5));
        assert_eq!(merged.max_loan, dec!(500000));
        assert_eq!(merged.max_months, 12);
    }

    #[test]
    fn test_rejects_inverted_limits() {
        let update = UpdateSettingsRequest {
            min_loan: Some(dec!(600000)),
            ..Default::default()
        };
        assert!(update.apply(&defaults()).is_err());
    }

    #[test]
    fn test_rejects_fee_over_hundred() {
        let update = UpdateSettingsRequest {
            processing_fee_percent: Some(dec!(101)),
            ..Default::default()
        };
        assert!(update.apply(&defaults()).is_err());
    }

    #[test]
    fn test_check_loan_request() {
        let settings = defaults();
        assert!(settings.check_loan_request(dec!(30000), 6).is_ok());
        assert!(settings.check_loan_request(dec!(999), 6).is_err());
        assert!(settings.check_loan_request(dec!(500001), 6).is_err());
        assert!(settings.check_loan_request(dec!(30000), 0).is_err());
        assert!(settings.check_loan_request(dec!(30000), 13).is_err());
        assert!(settings.check_loan_request(dec!(30000.005), 6).is_err());
        assert!(settings.check_loan_request(dec!(30000.50), 6).is_ok());
    }
}
