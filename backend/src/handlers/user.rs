//! Profile, dashboard, KYC and activity handlers

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::{ApiJson, ApiQuery, AuthenticatedUser};
use crate::error::ApiError;
use crate::models::{ApiResponse, UserResponse};
use crate::state::AppState;
use crate::user::{ActivityItem, ActivityQuery, Dashboard, SubmitKycRequest, UpdateProfileRequest};

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let profile = state.user_service.profile(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Profile", profile)))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()?;
    let profile = state.user_service.update_profile(user.user_id, req).await?;
    Ok(Json(ApiResponse::ok("Profile updated", profile)))
}

/// GET /api/users/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.user_service.dashboard(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Dashboard", dashboard)))
}

/// POST /api/users/kyc
pub async fn submit_kyc(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): ApiJson<SubmitKycRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()?;
    let profile = state.user_service.submit_kyc(user.user_id, req).await?;
    Ok(Json(ApiResponse::ok("KYC submitted", profile)))
}

/// GET /api/users/activity
pub async fn activity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Query(query), _): ApiQuery<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityItem>>>, ApiError> {
    let items = state.user_service.activity(user.user_id, query).await?;
    Ok(Json(ApiResponse::ok("Activity", items)))
}
