//! Authentication service
//!
//! Account creation, credential checks and session lifecycle.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    AuthProvider, AuthSession, AuthTokensResponse, ClientMeta, LoginRequest, RegisterRequest,
    User, UserRole, USER_COLUMNS,
};

use super::google::GoogleVerifier;
use super::jwt::{generate_access_token, generate_refresh_token, verify_token, JwtError, TokenType};
use super::password::{hash_password, verify_password};

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account signs in with Google")]
    UseSocialLogin,

    #[error("User not found")]
    UserNotFound,

    #[error("Session not found or revoked")]
    SessionNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Social login is not configured")]
    SocialLoginDisabled,

    #[error("Social login rejected: {0}")]
    SocialTokenRejected(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::DatabaseError(e.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::TokenExpired => AuthError::TokenExpired,
            other => AuthError::TokenError(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailTaken => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials
            | AuthError::UseSocialLogin
            | AuthError::SessionNotFound
            | AuthError::TokenExpired
            | AuthError::TokenError(_)
            | AuthError::InvalidRefreshToken
            | AuthError::SocialTokenRejected(_) => ApiError::Unauthorized(e.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(e.to_string()),
            AuthError::SocialLoginDisabled => ApiError::BadRequest(e.to_string()),
            AuthError::ProviderUnavailable(msg) => ApiError::ExternalServiceError(msg),
            AuthError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            AuthError::PasswordHash(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db_pool: PgPool,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_days: i64,
    bcrypt_cost: u32,
    google: GoogleVerifier,
}

impl AuthService {
    pub fn new(
        db_pool: PgPool,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        refresh_token_ttl_days: i64,
        google: GoogleVerifier,
    ) -> Self {
        Self {
            db_pool,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_days,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            google,
        }
    }

    /// Register an email/password account and sign it in
    pub async fn register(
        &self,
        req: RegisterRequest,
        meta: ClientMeta,
    ) -> Result<AuthTokensResponse, AuthError> {
        let email = req.email.trim().to_lowercase();

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_off_thread(req.password).await?;
        let now = Utc::now();

        let user: User = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, auth_provider, role, full_name, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .bind(AuthProvider::Local)
        .bind(UserRole::User)
        .bind(req.full_name.trim())
        .bind(&req.phone)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
            _ => AuthError::from(e),
        })?;

        tracing::info!(user_id = %user.id, "User registered");

        self.issue_tokens(user, meta).await
    }

    /// Email/password login
    pub async fn login(
        &self,
        req: LoginRequest,
        meta: ClientMeta,
    ) -> Result<AuthTokensResponse, AuthError> {
        let email = req.email.trim().to_lowercase();
        let user = self
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = match user.password_hash.clone() {
            Some(hash) => hash,
            None => return Err(AuthError::UseSocialLogin),
        };

        let password = req.password;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        if !matches {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_tokens(user, meta).await
    }

    /// Sign in (or sign up) with a Google ID token
    pub async fn google_login(
        &self,
        id_token: &str,
        meta: ClientMeta,
    ) -> Result<AuthTokensResponse, AuthError> {
        let identity = self.google.verify(id_token).await?;

        let by_provider: Option<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_provider = $1 AND provider_id = $2"
        ))
        .bind(AuthProvider::Google)
        .bind(&identity.subject)
        .fetch_optional(&self.db_pool)
        .await?;

        let user = match by_provider {
            Some(user) => user,
            None => match self.find_user_by_email(&identity.email).await? {
                // Existing email account: remember the Google subject for next time
                Some(user) => sqlx::query_as(&format!(
                    r#"
                    UPDATE users SET provider_id = COALESCE(provider_id, $1), updated_at = NOW()
                    WHERE id = $2
                    RETURNING {USER_COLUMNS}
                    "#
                ))
                .bind(&identity.subject)
                .bind(user.id)
                .fetch_one(&self.db_pool)
                .await?,
                None => {
                    let now = Utc::now();
                    let user: User = sqlx::query_as(&format!(
                        r#"
                        INSERT INTO users (id, email, auth_provider, provider_id, role, full_name, created_at, updated_at)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                        RETURNING {USER_COLUMNS}
                        "#
                    ))
                    .bind(Uuid::new_v4())
                    .bind(&identity.email)
                    .bind(AuthProvider::Google)
                    .bind(&identity.subject)
                    .bind(UserRole::User)
                    .bind(&identity.name)
                    .bind(now)
                    .fetch_one(&self.db_pool)
                    .await?;
                    tracing::info!(user_id = %user.id, "User registered via Google");
                    user
                }
            },
        };

        self.issue_tokens(user, meta).await
    }

    /// Create the bootstrap administrator if no account uses `email` yet
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim().to_lowercase();
        if let Some(existing) = self.find_user_by_email(&email).await? {
            if existing.role != UserRole::Admin {
                tracing::warn!(user_id = %existing.id, "Bootstrap admin email belongs to a regular user");
            }
            return Ok(());
        }

        let password_hash = self.hash_off_thread(password.to_string()).await?;
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, auth_provider, role, full_name)
            VALUES ($1, $2, $3, $4, $5, 'Administrator')
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .bind(AuthProvider::Local)
        .bind(UserRole::Admin)
        .execute(&self.db_pool)
        .await?;

        tracing::info!(email = %email, "Bootstrap admin account created");
        Ok(())
    }

    /// Refresh tokens using a valid refresh token
    pub async fn refresh_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<AuthTokensResponse, AuthError> {
        let claims = verify_token(refresh_token, &self.jwt_secret)?;

        if claims.token_type != TokenType::Refresh.as_str() {
            return Err(AuthError::InvalidRefreshToken);
        }

        let refresh_token_hash = hash_token(refresh_token);

        let session: AuthSession = sqlx::query_as(
            r#"
            SELECT id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at, revoked, revoked_at, created_at, updated_at
            FROM auth_sessions
            WHERE refresh_token_hash = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(&refresh_token_hash)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

        let user = self.get_user_by_id(session.user_id).await?;

        let jti = Uuid::new_v4().to_string();
        let access_token =
            generate_access_token(&user, &jti, &self.jwt_secret, self.access_token_ttl_seconds)?;
        let new_refresh_token = generate_refresh_token(
            &user,
            &Uuid::new_v4().to_string(),
            &self.jwt_secret,
            self.refresh_token_ttl_days,
        )?;

        let session_expires_at = Utc::now() + Duration::days(self.refresh_token_ttl_days);

        sqlx::query(
            r#"
            UPDATE auth_sessions
            SET jti = $1, refresh_token_hash = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&jti)
        .bind(hash_token(&new_refresh_token))
        .bind(session_expires_at)
        .bind(session.id)
        .execute(&self.db_pool)
        .await?;

        Ok(AuthTokensResponse {
            access_token,
            refresh_token: new_refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: user.into(),
        })
    }

    /// Revoke a session (logout)
    pub async fn revoke_session(&self, jti: &str) -> Result<(), AuthError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET revoked = TRUE, revoked_at = NOW()
            WHERE jti = $1 AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AuthError::SessionNotFound);
        }

        Ok(())
    }

    /// Revoke all sessions for a user
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE auth_sessions
            SET revoked = TRUE, revoked_at = NOW()
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Verify a session is valid (not revoked)
    pub async fn verify_session(&self, jti: &str) -> Result<AuthSession, AuthError> {
        sqlx::query_as(
            r#"
            SELECT id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at, revoked, revoked_at, created_at, updated_at
            FROM auth_sessions
            WHERE jti = $1 AND revoked = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or(AuthError::SessionNotFound)
    }

    /// Get JWT secret (for middleware access)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(user)
    }

    async fn hash_off_thread(&self, password: String) -> Result<String, AuthError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }

    /// Open a session and mint its token pair
    async fn issue_tokens(
        &self,
        user: User,
        meta: ClientMeta,
    ) -> Result<AuthTokensResponse, AuthError> {
        let jti = Uuid::new_v4().to_string();
        let access_token =
            generate_access_token(&user, &jti, &self.jwt_secret, self.access_token_ttl_seconds)?;

        let refresh_token = generate_refresh_token(
            &user,
            &Uuid::new_v4().to_string(),
            &self.jwt_secret,
            self.refresh_token_ttl_days,
        )?;

        let session_expires_at = Utc::now() + Duration::days(self.refresh_token_ttl_days);

        sqlx::query(
            r#"
            INSERT INTO auth_sessions (id, user_id, jti, refresh_token_hash, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(&jti)
        .bind(hash_token(&refresh_token))
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .bind(session_expires_at)
        .execute(&self.db_pool)
        .await?;

        Ok(AuthTokensResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            user: user.into(),
        })
    }
}

/// SHA-256 of a token, hex encoded, for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("refresh-token");
        assert_eq!(a, hash_token("refresh-token"));
        assert_ne!(a, hash_token("other-token"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let status = |e: AuthError| ApiError::from(e).status_code();
        assert_eq!(status(AuthError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(AuthError::SocialLoginDisabled), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AuthError::ProviderUnavailable("timeout".into())),
            StatusCode::BAD_GATEWAY
        );
    }
}
