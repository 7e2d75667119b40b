//! Borrower-facing loan handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use super::{ApiJson, ApiPath, AuthenticatedUser};
use crate::error::ApiError;
use crate::loan::{
    Loan, LoanOverview, RepayRequest, Repayment, RepaymentReceipt, Transaction, WithdrawRequest,
};
use crate::models::ApiResponse;
use crate::state::AppState;

/// GET /api/loans/active - Current loan with repayment progress
pub async fn active_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Option<LoanOverview>>>, ApiError> {
    let overview = state.loan_service.active_loan(user.user_id).await?;
    let message = if overview.is_some() {
        "Active loan"
    } else {
        "No active loan"
    };
    Ok(Json(ApiResponse::ok(message, overview)))
}

/// GET /api/loans/mine
pub async fn my_loans(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = state.loan_service.list_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Loans", loans)))
}

/// GET /api/loans/:id/repayments
pub async fn loan_repayments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<Repayment>>>, ApiError> {
    let repayments = state.loan_service.repayments(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok("Repayments", repayments)))
}

/// POST /api/loans/:id/repay
pub async fn repay_loan(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(req), _): ApiJson<RepayRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RepaymentReceipt>>), ApiError> {
    req.validate()?;
    let receipt = state
        .loan_service
        .repay(user.user_id, id, req.amount)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Repayment recorded", receipt)),
    ))
}

/// POST /api/loans/withdraw
pub async fn request_withdrawal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): ApiJson<WithdrawRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    req.validate()?;
    let withdrawal = state
        .loan_service
        .request_withdrawal(user.user_id, req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Withdrawal requested", withdrawal)),
    ))
}
