//! Access-token signing and validation.
//!
//! Editing clients receive a short-lived token from the embedding host and
//! pass it back on every protocol request as the `access_token` query
//! parameter. Tokens are HS256 JWTs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access-token configuration.
#[derive(Clone, Deserialize)]
pub struct AccessTokenConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,
}

fn default_expiry_secs() -> u64 {
    36_000 // 10 hours
}

impl std::fmt::Debug for AccessTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenConfig")
            .field("secret", &"[hidden]")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject the token was issued to.
    pub sub: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl AccessTokenClaims {
    /// Creates claims for `subject`, issued now.
    #[must_use]
    pub fn new(subject: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }
}

/// Errors that can occur during access-token operations.
#[derive(Debug, Error)]
pub enum AccessTokenError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is malformed or its signature does not match.
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Access-token service.
#[derive(Clone)]
pub struct AccessTokenService {
    expires_in: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for AccessTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenService")
            .field("expires_in", &self.expires_in)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl AccessTokenService {
    /// Creates a new access-token service with the given configuration.
    #[must_use]
    pub fn new(config: &AccessTokenConfig) -> Self {
        let secs = i64::try_from(config.expiry_secs).unwrap_or(i64::MAX);
        Self {
            expires_in: Duration::try_seconds(secs).unwrap_or(Duration::MAX),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Issues a token for `subject` valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AccessTokenError::Encoding` if token generation fails.
    pub fn issue(&self, subject: &str) -> Result<String, AccessTokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.expires_in)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.sign(&AccessTokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns `AccessTokenError::Encoding` if token generation fails.
    pub fn sign(&self, claims: &AccessTokenClaims) -> Result<String, AccessTokenError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AccessTokenError::Encoding(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// # Errors
    ///
    /// Returns `AccessTokenError::Expired` if the token has expired.
    /// Returns `AccessTokenError::Invalid` if the token is malformed.
    pub fn validate(&self, token: &str) -> Result<AccessTokenClaims, AccessTokenError> {
        let validation = Validation::default();

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                _ => AccessTokenError::Invalid(e.to_string()),
            })
    }

    /// Returns the token lifetime in seconds.
    #[must_use]
    pub fn expires_in_secs(&self) -> i64 {
        self.expires_in.num_seconds()
    }
}
