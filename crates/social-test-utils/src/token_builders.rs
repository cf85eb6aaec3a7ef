//! Builder for JWTs the service did or did not issue.
//!
//! Produces HS256 tokens signed with [`TEST_JWT_SECRET`] unless told
//! otherwise, so tests can exercise expiry, audience and signature checks
//! without going through the login endpoint.

use crate::fixtures::TEST_JWT_SECRET;
use chrono::{Duration, Utc};
use common::jwt::UserClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use social_service::config::{DEFAULT_JWT_AUDIENCE, DEFAULT_JWT_ISSUER};

/// # Example
/// ```rust,ignore
/// let expired = TestTokenBuilder::new()
///     .for_user(7)
///     .expires_in(-3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iss: String,
    aud: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    secret: Vec<u8>,
}

impl TestTokenBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "1".to_string(),
            iss: DEFAULT_JWT_ISSUER.to_string(),
            aud: DEFAULT_JWT_AUDIENCE.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            secret: TEST_JWT_SECRET.as_bytes().to_vec(),
        }
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.sub = user_id.to_string();
        self
    }

    /// Raw subject, for tokens whose subject is not a user id.
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = audience.to_string();
        self
    }

    /// Expiry relative to now; negative values produce an expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    pub fn signed_with(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    pub fn claims(&self) -> UserClaims {
        UserClaims {
            sub: self.sub.clone(),
            iss: self.iss.clone(),
            aud: self.aud.clone(),
            iat: self.iat,
            nbf: self.nbf,
            exp: self.exp,
        }
    }

    pub fn build(self) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        encode(&header, &self.claims(), &EncodingKey::from_secret(&self.secret))
            .expect("test token should encode")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
