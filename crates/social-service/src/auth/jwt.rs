//! HS256 token authenticator.
//!
//! Only HS256 is accepted. A token whose header names any other algorithm
//! (including `none` or an asymmetric scheme) fails validation before the
//! signature is even considered, which closes off algorithm confusion.
//!
//! Issuer, audience, `exp` and `nbf` are all enforced with
//! [`DEFAULT_LEEWAY_SECONDS`] of clock leeway. Every failure collapses into
//! the same client-facing message.

use crate::config::JwtConfig;
use crate::errors::SocialError;
use crate::observability::metrics::record_token_validation;
use common::jwt::{check_token_size, UserClaims, DEFAULT_LEEWAY_SECONDS};
use common::secret::ExposeSecret;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Issues and validates user access tokens. Stateless apart from its keys,
/// so one instance is shared across all requests.
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime_seconds: i64,
}

impl fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("keys", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime_seconds", &self.lifetime_seconds)
            .finish()
    }
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8], issuer: &str, audience: &str, lifetime_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "aud", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = DEFAULT_LEEWAY_SECONDS;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            lifetime_seconds,
        }
    }

    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            config.secret.expose_secret().as_bytes(),
            &config.issuer,
            &config.audience,
            config.expiry_seconds,
        )
    }

    /// Sign `claims` as an HS256 JWT.
    #[instrument(skip_all)]
    pub fn generate_token(&self, claims: &UserClaims) -> Result<String, SocialError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| SocialError::Internal(format!("JWT signing operation failed: {e}")))
    }

    /// Issue a token for `user_id` with this authenticator's issuer,
    /// audience and lifetime.
    pub fn issue_for_user(&self, user_id: i64) -> Result<String, SocialError> {
        let claims = UserClaims::for_user(
            user_id,
            &self.issuer,
            &self.audience,
            self.lifetime_seconds,
        );
        self.generate_token(&claims)
    }

    /// Verify signature, algorithm, issuer, audience and time bounds.
    ///
    /// # Errors
    ///
    /// Returns `SocialError::InvalidToken` for any failure.
    #[instrument(skip_all)]
    pub fn validate_token(&self, token: &str) -> Result<UserClaims, SocialError> {
        let result = check_token_size(token)
            .map_err(|e| e.to_string())
            .and_then(|()| {
                decode::<UserClaims>(token, &self.decoding_key, &self.validation)
                    .map(|data| data.claims)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(claims) => {
                record_token_validation("bearer", true);
                Ok(claims)
            }
            Err(reason) => {
                tracing::debug!(target: "social.auth", reason = %reason, "Token verification failed");
                record_token_validation("bearer", false);
                Err(SocialError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()))
            }
        }
    }
}
