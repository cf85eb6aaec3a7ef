//! Metrics and log-correlation helpers.
//!
//! # Privacy by Default
//!
//! Handlers and services use `#[instrument(skip_all)]` and add fields
//! explicitly. Emails, passwords, activation tokens and bearer tokens never
//! appear in logs; identifiers that need correlation (an email at login, a
//! client IP at rate-limit time) go through [`hash_for_correlation`].

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a value for correlation in logs (SHA-256, first 8 hex chars).
///
/// This is a one-way correlation aid, not a protection for secrets.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}
