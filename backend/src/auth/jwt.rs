//! JWT token generation and validation
//!
//! Handles creation and verification of access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// `USER` or `ADMIN`
    pub role: String,
    /// JWT ID (for revocation)
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    /// `access` or `refresh`
    pub token_type: String,
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Generate an access token for a user
pub fn generate_access_token(
    user: &User,
    jti: &str,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    generate_token(user, jti, secret, ttl_seconds, TokenType::Access)
}

/// Generate a refresh token for a user
pub fn generate_refresh_token(
    user: &User,
    jti: &str,
    secret: &str,
    ttl_days: i64,
) -> Result<String, JwtError> {
    let ttl_seconds = ttl_days * 24 * 60 * 60;
    generate_token(user, jti, secret, ttl_seconds, TokenType::Refresh)
}

fn generate_token(
    user: &User,
    jti: &str,
    secret: &str,
    ttl_seconds: i64,
    token_type: TokenType,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_seconds);

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        jti: jti.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        token_type: token_type.as_str().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

/// Extract user ID from claims
pub fn get_user_id_from_claims(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthProvider, KycStatus, UserRole};

    fn create_test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "borrower@example.com".to_string(),
            password_hash: None,
            auth_provider: AuthProvider::Local,
            provider_id: None,
            role,
            full_name: Some("Test Borrower".to_string()),
            phone: None,
            address: None,
            credit_score: Some(700),
            kyc_status: KycStatus::NotSubmitted,
            kyc_document_type: None,
            kyc_document_number: None,
            kyc_submitted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_access_token() {
        let user = create_test_user(UserRole::Admin);
        let jti = Uuid::new_v4().to_string();
        let secret = "test-secret-key";

        let token = generate_access_token(&user, &jti, secret, 900).unwrap();
        let claims = verify_token(&token, secret).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "ADMIN");
        assert_eq!(claims.token_type, "access");
        assert_eq!(get_user_id_from_claims(&claims).unwrap(), user.id);
    }

    #[test]
    fn test_generate_refresh_token() {
        let user = create_test_user(UserRole::User);
        let token = generate_refresh_token(&user, "jti-1", "test-secret-key", 7).unwrap();

        let claims = verify_token(&token, "test-secret-key").unwrap();
        assert_eq!(claims.token_type, "refresh");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_expired_token() {
        let user = create_test_user(UserRole::User);
        let token = generate_access_token(&user, "jti-2", "test-secret-key", -120).unwrap();

        assert!(matches!(
            verify_token(&token, "test-secret-key"),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let user = create_test_user(UserRole::User);
        let token = generate_access_token(&user, "jti-3", "secret1", 900).unwrap();

        assert!(verify_token(&token, "secret2").is_err());
        assert!(verify_token("invalid.token.here", "secret1").is_err());
    }
}
