//! Middleware for the MicroLend API
//!
//! Request tracing, rate limiting, security headers and authentication
//! extractors.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

use axum::http::HeaderMap;

pub use auth::{AdminUser, AuthenticatedUser};
pub use rate_limiter::{rate_limit, RateLimiter, IDLE_BUCKET_AGE};
pub use security::{hsts_header, security_headers};
pub use tracing::request_tracing;

/// Client IP from proxy headers (`X-Forwarded-For` first hop, then `X-Real-IP`)
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_client_ip_falls_back() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));
    }
}
