//! JWT utilities shared by the API service and its test utilities.
//!
//! This module provides:
//! - Size limits checked before any decoding
//! - The leeway applied to `exp`/`nbf` checks
//! - The user token claims structure
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Error messages are generic so callers cannot probe why a token failed
//! - The `sub` field in claims is redacted in Debug output

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum allowed JWT size in bytes (8KB).
///
/// User tokens are a few hundred bytes; anything larger is rejected before
/// base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Leeway in seconds applied to `exp` and `nbf` validation.
pub const DEFAULT_LEEWAY_SECONDS: u64 = 30;

/// Errors raised by the shared JWT helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// `sub` is not a numeric user id.
    #[error("The access token is invalid or expired")]
    MalformedSubject,
}

/// Claims carried by user access tokens.
///
/// `sub` holds the numeric user id as a decimal string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject (user id), redacted in Debug output.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at (Unix epoch seconds).
    pub iat: i64,
    /// Not-before (Unix epoch seconds).
    pub nbf: i64,
    /// Expiration (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("sub", &"[REDACTED]")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .finish()
    }
}

impl UserClaims {
    /// Build claims for `user_id`, valid from now for `lifetime_seconds`.
    #[must_use]
    pub fn for_user(user_id: i64, issuer: &str, audience: &str, lifetime_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(lifetime_seconds),
        }
    }

    /// Parse the subject back into a user id.
    ///
    /// # Errors
    ///
    /// Returns `JwtValidationError::MalformedSubject` when `sub` is not an integer.
    pub fn user_id(&self) -> Result<i64, JwtValidationError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| JwtValidationError::MalformedSubject)
    }
}

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` for oversized tokens.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}
