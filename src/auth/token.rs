use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::Role;

/// Identity claims embedded in a session token. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role, ttl_secs: u64) -> Self {
        let iat = Utc::now().timestamp();
        let exp = iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX));

        Self {
            name: name.into(),
            email: email.into(),
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid")]
    Invalid,

    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// Issues and verifies HS256 session tokens
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<Keys>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
    has_secret: bool,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl_secs,
                has_secret: !secret.is_empty(),
            }),
        }
    }

    /// Issue a token for the given identity using the configured lifetime
    pub fn issue(&self, name: &str, email: &str, role: Role) -> Result<String, TokenError> {
        self.sign(&Claims::new(name, email, role, self.inner.ttl_secs))
    }

    /// Sign an already-built set of claims
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        if !self.inner.has_secret {
            return Err(TokenError::MissingSecret);
        }

        encode(&Header::default(), claims, &self.inner.encoding)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify signature and lifetime, returning the embedded claims.
    ///
    /// Expiry is reported separately from every other failure.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if !self.inner.has_secret {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.inner.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.inner.ttl_secs)
            .finish_non_exhaustive()
    }
}
