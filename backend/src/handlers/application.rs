//! Borrower-facing application handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;
use validator::Validate;

use super::{ApiJson, ApiPath, AuthenticatedUser};
use crate::application::{
    Application, ApplicationDetail, ApplicationDocument, CreateApplicationRequest,
    SubmissionOutcome, UploadDocumentRequest,
};
use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::state::AppState;

/// POST /api/applications - Submit an application (auto-approval runs here)
pub async fn submit_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(req), _): ApiJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionOutcome>>), ApiError> {
    req.validate()?;
    let outcome = state.application_service.submit(user.user_id, req).await?;

    let message = if outcome.auto_approved {
        "Application approved automatically"
    } else {
        "Application submitted for review"
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, outcome))))
}

/// GET /api/applications/mine
pub async fn list_my_applications(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Application>>>, ApiError> {
    let applications = state.application_service.list_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Applications", applications)))
}

/// GET /api/applications/:id
pub async fn get_my_application(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<ApplicationDetail>>, ApiError> {
    let detail = state
        .application_service
        .get_for_user(user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::ok("Application", detail)))
}

/// POST /api/applications/:id/documents
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
    WithRejection(Json(req), _): ApiJson<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApplicationDocument>>), ApiError> {
    req.validate()?;
    let document = state
        .application_service
        .upload_document(user.user_id, id, req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Document uploaded", document)),
    ))
}
