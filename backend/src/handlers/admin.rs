//! Admin handlers: application review, loans, settings, withdrawals, users

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use super::{AdminUser, ApiJson, ApiPath, ApiQuery};
use crate::analytics::PlatformAnalytics;
use crate::application::{
    Application, ListApplicationsQuery, RejectApplicationRequest, UpdateProgressRequest,
};
use crate::contact::ContactMessage;
use crate::error::ApiError;
use crate::loan::{DecideWithdrawalRequest, ListLoansQuery, ListWithdrawalsQuery, Loan, Transaction};
use crate::models::{ApiResponse, PaginatedResponse, PaginationParams, User, UserResponse};
use crate::settings::{Settings, UpdateSettingsRequest};
use crate::state::AppState;
use crate::user::{ListUsersQuery, ReviewKycRequest, SetCreditScoreRequest};

// Applications

pub async fn list_applications(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<ListApplicationsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Application>>>, ApiError> {
    let page = state.application_service.admin_list(query).await?;
    Ok(Json(ApiResponse::ok("Applications", page)))
}

/// POST /api/admin/applications/:id/review
pub async fn review_application(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let application = state
        .application_service
        .mark_review(id, admin.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Application under review", application)))
}

pub async fn approve_application(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let application = state.application_service.approve(id, admin.user_id).await?;
    Ok(Json(ApiResponse::ok("Application approved", application)))
}

pub async fn reject_application(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    body: Option<Json<RejectApplicationRequest>>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let Json(req) = body.unwrap_or_default();
    req.validate()?;
    let application = state
        .application_service
        .reject(id, admin.user_id, req.reason)
        .await?;
    Ok(Json(ApiResponse::ok("Application rejected", application)))
}

/// PUT /api/admin/applications/:id/progress
pub async fn update_progress(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(req), _): ApiJson<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    req.validate()?;
    let application = state.application_service.update_progress(id, req).await?;
    Ok(Json(ApiResponse::ok("Progress updated", application)))
}

/// POST /api/admin/applications/:id/confirm-fee - Creates the loan
pub async fn confirm_fee(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = state
        .loan_service
        .confirm_processing_fee(id, admin.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Processing fee confirmed", loan)))
}

// Loans

pub async fn disburse_loan(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = state.loan_service.disburse_loan(id, admin.user_id).await?;
    Ok(Json(ApiResponse::ok("Loan disbursed", loan)))
}

pub async fn list_loans(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<ListLoansQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Loan>>>, ApiError> {
    let page = state.loan_service.admin_list(query).await?;
    Ok(Json(ApiResponse::ok("Loans", page)))
}

// Settings and analytics

pub async fn get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let settings = state.settings_service.get().await?;
    Ok(Json(ApiResponse::ok("Settings", settings)))
}

pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Json(req), _): ApiJson<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<Settings>>, ApiError> {
    let settings = state.settings_service.update(req, admin.user_id).await?;
    Ok(Json(ApiResponse::ok("Settings updated", settings)))
}

pub async fn analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<PlatformAnalytics>>, ApiError> {
    let overview = state.analytics_service.overview().await?;
    Ok(Json(ApiResponse::ok("Platform analytics", overview)))
}

// Withdrawals

pub async fn list_withdrawals(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<ListWithdrawalsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Transaction>>>, ApiError> {
    let page = state.loan_service.list_withdrawals(query).await?;
    Ok(Json(ApiResponse::ok("Withdrawals", page)))
}

async fn decide_withdrawal(
    state: AppState,
    admin_id: Uuid,
    id: Uuid,
    approve: bool,
    body: Option<Json<DecideWithdrawalRequest>>,
) -> Result<Transaction, ApiError> {
    let Json(req) = body.unwrap_or_default();
    req.validate()?;
    state
        .loan_service
        .decide_withdrawal(id, approve, admin_id, req.note)
        .await
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    body: Option<Json<DecideWithdrawalRequest>>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let withdrawal = decide_withdrawal(state, admin.user_id, id, true, body).await?;
    Ok(Json(ApiResponse::ok("Withdrawal approved", withdrawal)))
}

pub async fn reject_withdrawal(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    body: Option<Json<DecideWithdrawalRequest>>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let withdrawal = decide_withdrawal(state, admin.user_id, id, false, body).await?;
    Ok(Json(ApiResponse::ok("Withdrawal rejected", withdrawal)))
}

// Users

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<ListUsersQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<User>>>, ApiError> {
    let page = state.user_service.list_users(query).await?;
    Ok(Json(ApiResponse::ok("Users", page)))
}

/// PUT /api/admin/users/:id/kyc
pub async fn review_kyc(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(req), _): ApiJson<ReviewKycRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .user_service
        .review_kyc(id, req.status, admin.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("KYC reviewed", user)))
}

/// PUT /api/admin/users/:id/credit-score
pub async fn set_credit_score(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(req), _): ApiJson<SetCreditScoreRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()?;
    let user = state
        .user_service
        .set_credit_score(id, req.credit_score, admin.user_id)
        .await?;
    Ok(Json(ApiResponse::ok("Credit score updated", user)))
}

// Contact inbox

pub async fn list_contact_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(pagination), _): ApiQuery<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<ContactMessage>>>, ApiError> {
    let page = state.contact_service.list(pagination).await?;
    Ok(Json(ApiResponse::ok("Contact messages", page)))
}

pub async fn mark_contact_handled(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ContactMessage>>, ApiError> {
    let message = state.contact_service.mark_handled(id).await?;
    Ok(Json(ApiResponse::ok("Message marked as handled", message)))
}
