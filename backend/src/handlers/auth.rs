//! Authentication HTTP handlers

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use super::{ApiJson, AuthenticatedUser};
use crate::error::ApiError;
use crate::middleware::client_ip;
use crate::models::{
    ApiResponse, AuthTokensResponse, ClientMeta, GoogleLoginRequest, LoginRequest,
    RefreshTokenRequest, RegisterRequest, UserResponse,
};
use crate::state::AppState;

fn client_meta(headers: &HeaderMap) -> ClientMeta {
    ClientMeta {
        ip_address: client_ip(headers),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(req), _): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthTokensResponse>>), ApiError> {
    req.validate()?;
    let tokens = state
        .auth_service
        .register(req, client_meta(&headers))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Account created", tokens)),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(req), _): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthTokensResponse>>, ApiError> {
    req.validate()?;
    let tokens = state.auth_service.login(req, client_meta(&headers)).await?;
    Ok(Json(ApiResponse::ok("Logged in", tokens)))
}

/// POST /api/auth/google - Sign in with a Google ID token
pub async fn google_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(req), _): ApiJson<GoogleLoginRequest>,
) -> Result<Json<ApiResponse<AuthTokensResponse>>, ApiError> {
    req.validate()?;
    let tokens = state
        .auth_service
        .google_login(&req.id_token, client_meta(&headers))
        .await?;
    Ok(Json(ApiResponse::ok("Logged in", tokens)))
}

/// POST /api/auth/refresh - Rotate the refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    WithRejection(Json(req), _): ApiJson<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<AuthTokensResponse>>, ApiError> {
    let tokens = state.auth_service.refresh_tokens(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok("Tokens refreshed", tokens)))
}

/// POST /api/auth/logout - Revoke current session
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.auth_service.revoke_session(&user.jti).await?;
    Ok(Json(ApiResponse::message("Logged out")))
}

#[derive(Debug, serde::Serialize)]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}

/// POST /api/auth/logout-all - Revoke every session of the current user
pub async fn logout_all(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<LogoutAllResponse>>, ApiError> {
    let revoked_sessions = state.auth_service.revoke_all_sessions(user.user_id).await?;
    Ok(Json(ApiResponse::ok(
        "Logged out everywhere",
        LogoutAllResponse { revoked_sessions },
    )))
}

/// GET /api/auth/me
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.auth_service.get_user_by_id(user.user_id).await?;
    Ok(Json(ApiResponse::ok("Current user", user.into())))
}
