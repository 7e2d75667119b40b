//! Shared data models for the MicroLend backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub provider_id: Option<String>,
    pub role: UserRole,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Set by an administrator; nothing in the platform computes it
    pub credit_score: Option<i32>,
    pub kyc_status: KycStatus,
    pub kyc_document_type: Option<String>,
    pub kyc_document_number: Option<String>,
    pub kyc_submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching [`User`]
pub const USER_COLUMNS: &str = "id, email, password_hash, auth_provider, provider_id, role, \
    full_name, phone, address, credit_score, kyc_status, kyc_document_type, \
    kyc_document_number, kyc_submitted_at, created_at, updated_at";

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            auth_provider: user.auth_provider,
            full_name: user.full_name,
            phone: user.phone,
            address: user.address,
            credit_score: user.credit_score,
            kyc_status: user.kyc_status,
            created_at: user.created_at,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(UserRole::User),
            "ADMIN" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// How the account authenticates
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "auth_provider", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthProvider {
    Local,
    Google,
}

/// Know-your-customer verification state
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "kyc_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
}

/// Uniform response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Deserialize, Default)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// 1-based page and clamped page size
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (page, limit)
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.resolve();
        (page - 1) * limit
    }
}

/// Paginated response
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_clamping() {
        let params = PaginationParams::default();
        assert_eq!(params.resolve(), (1, 20));
        assert_eq!(params.offset(), 0);

        let params = PaginationParams {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(params.resolve(), (3, 100));
        assert_eq!(params.offset(), 200);

        let params = PaginationParams {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(params.resolve(), (1, 1));
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::ok("Loaded", 5)).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Loaded");
        assert_eq!(body["data"], 5);

        let body = serde_json::to_value(ApiResponse::message("Done")).unwrap();
        assert!(body.get("data").is_none());
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(UserRole::parse(UserRole::Admin.as_str()), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("admin"), None);
    }
}
