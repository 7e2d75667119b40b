//! Authentication module for MicroLend
//!
//! - Email/password accounts with bcrypt hashes
//! - Google social login (ID token verification)
//! - JWT access/refresh tokens backed by revocable sessions

mod google;
mod jwt;
mod password;
mod service;

pub use google::{GoogleIdentity, GoogleVerifier};
pub use jwt::{
    generate_access_token, generate_refresh_token, get_user_id_from_claims, verify_token, Claims,
    JwtError, TokenType,
};
pub use password::{hash_password, verify_password};
pub use service::{AuthError, AuthService};
