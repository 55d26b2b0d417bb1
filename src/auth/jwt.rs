//! JWT Token Handler
//! Mission: Issue and verify compact, expiring identity tokens

use crate::auth::models::{Claims, Role};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;

/// Why a token failed verification. Exactly two categories leave this
/// module: expired, and everything else. Callers must not learn more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "token expired"),
            TokenError::Invalid => write!(f, "token invalid"),
        }
    }
}

impl std::error::Error for TokenError {}

/// HS256 issuer/verifier around a process-wide symmetric secret.
///
/// The secret string is consumed into the keys at construction and never
/// retained, so it cannot end up in logs or debug output.
pub struct JwtHandler {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtHandler {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::default();
        // Expiry is absolute: no grace window once `exp` has passed.
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Sign a token for a subject. Expiry is issue time plus the configured
    /// TTL; nothing beyond subject id and role is embedded.
    pub fn issue(&self, subject: Uuid, role: Role) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding).context("Failed to sign token")
    }

    /// Verify a token and extract its claims.
    ///
    /// Signature mismatch, malformed structure and unsupported algorithms
    /// are all `Invalid`; only a good signature past its expiry is
    /// `Expired`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }
}
