//! Google ID token verification for social login

use serde::Deserialize;
use std::time::Duration;

use super::AuthError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Fields of Google's `tokeninfo` response that we rely on
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    pub email: Option<String>,
    /// Google returns this as the string `"true"`; accept a bool as well.
    #[serde(default)]
    pub email_verified: serde_json::Value,
    pub name: Option<String>,
}

/// Verified identity extracted from an ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

/// Verifies Google ID tokens through the `tokeninfo` endpoint
#[derive(Clone)]
pub struct GoogleVerifier {
    http: reqwest::Client,
    client_id: Option<String>,
    tokeninfo_url: String,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self::with_endpoint(client_id, TOKENINFO_URL.to_string())
    }

    pub fn with_endpoint(client_id: Option<String>, tokeninfo_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            client_id,
            tokeninfo_url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client_id.is_some()
    }

    pub async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(AuthError::SocialLoginDisabled)?;

        let response = self
            .http
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(AuthError::SocialTokenRejected(
                "Google rejected the ID token".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(AuthError::ProviderUnavailable(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        identity_from_token_info(info, client_id)
    }
}

/// Check audience and email verification on a decoded token
pub fn identity_from_token_info(
    info: TokenInfo,
    client_id: &str,
) -> Result<GoogleIdentity, AuthError> {
    if info.aud != client_id {
        return Err(AuthError::SocialTokenRejected(
            "Token was issued for a different client".to_string(),
        ));
    }

    let verified = match &info.email_verified {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => s == "true",
        _ => false,
    };

    let email = match info.email {
        Some(email) if verified => email.to_lowercase(),
        _ => {
            return Err(AuthError::SocialTokenRejected(
                "Google account has no verified email".to_string(),
            ))
        }
    };

    Ok(GoogleIdentity {
        subject: info.sub,
        email,
        name: info.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_info(aud: &str, verified: serde_json::Value) -> TokenInfo {
        TokenInfo {
            aud: aud.to_string(),
            sub: "1171".to_string(),
            email: Some("Borrower@Example.com".to_string()),
            email_verified: verified,
            name: Some("Borrower".to_string()),
        }
    }

    #[test]
    fn test_accepts_matching_audience() {
        let identity =
            identity_from_token_info(token_info("client-1", "true".into()), "client-1").unwrap();
        assert_eq!(identity.subject, "1171");
        assert_eq!(identity.email, "borrower@example.com");
    }

    #[test]
    fn test_rejects_other_audience() {
        let result = identity_from_token_info(token_info("client-2", true.into()), "client-1");
        assert!(matches!(result, Err(AuthError::SocialTokenRejected(_))));
    }

    #[test]
    fn test_rejects_unverified_email() {
        let result = identity_from_token_info(token_info("client-1", "false".into()), "client-1");
        assert!(matches!(result, Err(AuthError::SocialTokenRejected(_))));
    }

    #[tokio::test]
    async fn test_disabled_without_client_id() {
        let verifier = GoogleVerifier::new(None);
        assert!(!verifier.is_enabled());
        assert!(matches!(
            verifier.verify("token").await,
            Err(AuthError::SocialLoginDisabled)
        ));
    }
}
