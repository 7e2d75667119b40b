//! Authentication extractors
//!
//! Bearer-token verification and role checks for handlers.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    get_user_id_from_claims, verify_token, AuthError, AuthService, JwtError, TokenType,
};
use crate::error::ApiError;
use crate::models::UserRole;

/// Authenticated user extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub jti: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extractor for authenticated users
///
/// Verifies the bearer token, checks it is an access token and that its
/// session has not been revoked.
///
/// ```rust,ignore
/// async fn protected_handler(user: AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, user {}", user.user_id)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let claims = verify_token(bearer.token(), auth_service.jwt_secret()).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        })?;

        if claims.token_type != TokenType::Access.as_str() {
            return Err(ApiError::Unauthorized("Expected access token".to_string()));
        }

        let user_id = get_user_id_from_claims(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        let role = UserRole::parse(&claims.role)
            .ok_or_else(|| ApiError::Unauthorized("Invalid role in token".to_string()))?;

        auth_service
            .verify_session(&claims.jti)
            .await
            .map_err(session_rejection)?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            role,
            jti: claims.jti,
        })
    }
}

/// A missing or revoked session is a 401; lookup failures keep their own status
fn session_rejection(err: AuthError) -> ApiError {
    match err {
        AuthError::SessionNotFound => {
            ApiError::Unauthorized("Session has been revoked".to_string())
        }
        other => other.into(),
    }
}

/// Extractor requiring the `ADMIN` role
pub struct AdminUser(pub AuthenticatedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_revoked_session_is_unauthorized() {
        let err = session_rejection(AuthError::SessionNotFound);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_session_lookup_failure_is_server_error() {
        let err = session_rejection(AuthError::DatabaseError("connection refused".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("connection"));
    }
}
