//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used across the Social services for
//! passwords, the JWT signing secret, SMTP credentials and operator
//! credentials. `SecretString` redacts itself in `Debug`, so any struct that
//! derives `Debug` while holding one is safe to log.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct OperatorCredentials {
//!     user: String,
//!     pass: SecretString,
//! }
//!
//! let creds = OperatorCredentials {
//!     user: "admin".to_string(),
//!     pass: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{creds:?}").contains("hunter2"));
//! assert_eq!(creds.pass.expose_secret(), "hunter2");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// Compare a presented value against a configured secret without
/// short-circuiting on the first differing byte.
///
/// The length check does leak whether the lengths match; the contents are
/// always compared in full.
#[must_use]
pub fn secrets_match(expected: &SecretString, presented: &str) -> bool {
    constant_time_eq(expected.expose_secret().as_bytes(), presented.as_bytes())
}

/// Byte-wise comparison whose running time depends only on the input length.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_secrets_match_equal_values() {
        let secret = SecretString::from("s3cr3t-pass");
        assert!(secrets_match(&secret, "s3cr3t-pass"));
    }

    #[test]
    fn test_secrets_match_rejects_different_value_same_length() {
        let secret = SecretString::from("s3cr3t-pass");
        assert!(!secrets_match(&secret, "s3cr3t-pasS"));
    }

    #[test]
    fn test_secrets_match_rejects_prefix() {
        let secret = SecretString::from("s3cr3t-pass");
        assert!(!secrets_match(&secret, "s3cr3t"));
        assert!(!secrets_match(&secret, ""));
    }

    #[test]
    fn test_constant_time_eq_empty_inputs() {
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"", b"a"));
    }

    #[test]
    fn test_deserialized_secret_stays_redacted() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct SmtpCredentials {
            username: String,
            password: SecretString,
        }

        let json = r#"{"username": "mailer", "password": "smtp-secret-value"}"#;
        let creds: SmtpCredentials = serde_json::from_str(json).expect("deserialize");

        assert_eq!(creds.password.expose_secret(), "smtp-secret-value");

        let debug = format!("{creds:?}");
        assert!(!debug.contains("smtp-secret-value"));
        assert!(debug.contains("REDACTED"));
    }
}
