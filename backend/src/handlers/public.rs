//! Unauthenticated endpoints: settings, loan calculator and contact form

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ApiJson;
use crate::contact::ContactRequest;
use crate::error::ApiError;
use crate::lending::{calculate, processing_fee, LoanQuote};
use crate::models::ApiResponse;
use crate::settings::{PublicSettings, SettingsService};
use crate::state::AppState;

/// Upper bound for calculator rates, in percent
const MAX_RATE_PERCENT: Decimal = Decimal::ONE_THOUSAND;

/// Calculator input; missing rates fall back to the platform settings
#[derive(Debug, Deserialize, Validate)]
pub struct CalculateRequest {
    pub amount: Decimal,
    #[validate(range(min = 1, max = 1200))]
    pub term_months: i32,
    pub interest_rate: Option<Decimal>,
    pub processing_fee_percent: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct CalculationResponse {
    #[serde(flatten)]
    pub quote: LoanQuote,
    pub processing_fee: Decimal,
}

/// GET /api/public/settings
pub async fn public_settings(
    State(settings): State<Arc<SettingsService>>,
) -> Result<Json<ApiResponse<PublicSettings>>, ApiError> {
    let current = settings.get().await?;
    Ok(Json(ApiResponse::ok("Platform settings", current.into())))
}

/// POST /api/public/calculate
pub async fn calculate_loan(
    State(settings): State<Arc<SettingsService>>,
    WithRejection(Json(req), _): ApiJson<CalculateRequest>,
) -> Result<Json<ApiResponse<CalculationResponse>>, ApiError> {
    req.validate()?;
    let (rate, fee_percent) = match (req.interest_rate, req.processing_fee_percent) {
        (Some(rate), Some(fee)) => (rate, fee),
        (rate, fee) => {
            let current = settings.get().await?;
            (
                rate.unwrap_or(current.interest_rate),
                fee.unwrap_or(current.processing_fee_percent),
            )
        }
    };

    if rate > MAX_RATE_PERCENT || fee_percent > MAX_RATE_PERCENT {
        return Err(ApiError::BadRequest(format!(
            "Rates cannot exceed {}%",
            MAX_RATE_PERCENT
        )));
    }

    let quote = calculate(req.amount, rate, req.term_months)?.rounded();
    let response = CalculationResponse {
        quote,
        processing_fee: processing_fee(req.amount, fee_percent)?,
    };
    Ok(Json(ApiResponse::ok("Loan calculation", response)))
}

/// POST /api/public/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    req.validate()?;
    state.contact_service.submit(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("Thank you, we will get back to you shortly")),
    ))
}
