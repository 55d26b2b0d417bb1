//! Credential Hasher
//! Mission: Slow, salted password hashing that never blocks the runtime

use crate::auth::errors::ApiError;
use tracing::error;

/// Minimum accepted plaintext length. Checked before any hashing work.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Default bcrypt work factor. Expensive enough to bound offline cracking
/// throughput, bounded so interactive login stays sub-second.
pub const DEFAULT_COST: u32 = 12;

/// Work factors bcrypt itself accepts; anything outside fails at hash time.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Reject plaintexts that are too short to be accepted at all.
pub fn validate_password(plaintext: &str) -> Result<(), ApiError> {
    if plaintext.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Please enter a password with {} or more characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a plaintext with a fresh random salt.
///
/// bcrypt salts internally, so two hashes of the same plaintext differ.
/// The work runs on the blocking pool; at cost 12 a hash takes long enough
/// that doing it on the async runtime would stall unrelated requests.
pub async fn hash_password(plaintext: String, cost: u32) -> Result<String, ApiError> {
    validate_password(&plaintext)?;

    tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
        .await
        .map_err(|e| {
            error!("hashing task panicked: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("bcrypt hash failed: {}", e);
            ApiError::Internal
        })
}

/// Verify a plaintext against a stored digest.
///
/// Uses bcrypt's own comparison, which is constant-time with respect to
/// where a mismatch occurs.
pub async fn verify_password(plaintext: String, digest: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest))
        .await
        .map_err(|e| {
            error!("verify task panicked: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("bcrypt verify failed: {}", e);
            ApiError::Internal
        })
}
