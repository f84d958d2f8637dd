use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tracing::debug;

use crate::errors::AuthError;
use crate::models::{GoogleTokenResponse, JwtClaims, ServiceAccountKey};

/// OAuth2 scope granting permission to send FCM messages
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Short-lived bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    /// Unix timestamp; informational only, tokens are never reused across sends
    pub expires_at: i64,
}

/// Exchanges a credential blob for a bearer token.
///
/// Called once per send; implementations must not assume any caching by the
/// caller.
pub trait TokenProvider: Send + Sync {
    fn access_token(&self, credentials: &[u8]) -> Result<AccessToken, AuthError>;
}

/// Google service-account JWT-bearer flow
#[derive(Debug, Clone)]
pub struct ServiceAccountTokenProvider {
    http_client: reqwest::blocking::Client,
    scope: String,
    assertion_lifetime: Duration,
}

impl ServiceAccountTokenProvider {
    pub fn new(http_client: reqwest::blocking::Client) -> Self {
        Self {
            http_client,
            scope: FIREBASE_MESSAGING_SCOPE.to_string(),
            assertion_lifetime: Duration::hours(1),
        }
    }

    /// Request a different scope than firebase.messaging
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Build and sign the assertion JWT for `key`
    pub fn sign_assertion(&self, key: &ServiceAccountKey) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            iss: key.client_email.clone(),
            sub: key.client_email.clone(),
            scope: self.scope.clone(),
            aud: key.token_uri.clone(),
            exp: (now + self.assertion_lifetime).timestamp(),
            iat: now.timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        if !key.private_key_id.is_empty() {
            header.kid = Some(key.private_key_id.clone());
        }

        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(AuthError::KeyParse)?;

        encode(&header, &claims, &encoding_key).map_err(AuthError::JwtEncode)
    }
}

impl TokenProvider for ServiceAccountTokenProvider {
    fn access_token(&self, credentials: &[u8]) -> Result<AccessToken, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_slice(credentials).map_err(AuthError::InvalidCredentials)?;

        let assertion = self.sign_assertion(&key)?;

        debug!(
            client_email = %key.client_email,
            token_uri = %key.token_uri,
            "Exchanging service account assertion for access token"
        );

        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&params)
            .send()
            .map_err(AuthError::TokenRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuthError::TokenRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: GoogleTokenResponse =
            response.json().map_err(AuthError::TokenParse)?;

        Ok(AccessToken {
            access_token: token_response.access_token,
            expires_at: Utc::now().timestamp() + token_response.expires_in,
        })
    }
}
