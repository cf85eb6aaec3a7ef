//! Password hashing and activation token primitives.

use crate::errors::SocialError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::secret::SecretString;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use tracing::instrument;

/// Random bytes behind each activation token.
pub const ACTIVATION_TOKEN_BYTES: usize = 32;

/// Hash a password with bcrypt.
///
/// # Errors
///
/// Returns `SocialError::BadRequest` if bcrypt rejects the input or cost.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, SocialError> {
    bcrypt::hash(password, cost).map_err(|e| {
        tracing::debug!(target: "social.crypto", error = %e, "Password hashing failed");
        SocialError::BadRequest("Password could not be processed".to_string())
    })
}

/// Check `password` against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or_else(|e| {
        tracing::warn!(target: "social.crypto", error = %e, "Stored password hash is unreadable");
        false
    })
}

/// Generate cryptographically secure random bytes.
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, SocialError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| SocialError::Internal(format!("Random bytes generation failed: {e}")))?;
    Ok(bytes)
}

/// Generate a plaintext activation token (URL-safe base64, no padding).
pub fn generate_activation_token() -> Result<SecretString, SocialError> {
    let bytes = generate_random_bytes(ACTIVATION_TOKEN_BYTES)?;
    Ok(SecretString::from(URL_SAFE_NO_PAD.encode(bytes)))
}

/// SHA-256 hex digest of a token; the only form the store ever sees.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
