//! Authentication gates.
//!
//! - `require_basic_auth` - operator credentials for health and similar endpoints
//! - `require_user` - bearer token resolved to a [`User`] via the cache and store
//!
//! Both reject with 401. The bearer gate never reports whether the token's
//! subject exists: a deleted user and a forged subject fail the same way.

use crate::errors::SocialError;
use crate::models::User;
use crate::observability::metrics::record_token_validation;
use crate::routes::AppState;
use crate::services::user_service;
use crate::store::StoreError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::secret::{constant_time_eq, secrets_match};
use std::sync::Arc;
use tracing::instrument;

/// The authenticated user for this request, inserted by [`require_user`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = SocialError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            SocialError::Internal("CurrentUser requested on a route without require_user".to_string())
        })
    }
}

fn authorization_header(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
}

/// Decode `Basic <base64(user:pass)>` into its two halves.
fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Split `Bearer <token>`. Anything other than exactly two space-separated
/// parts with the `Bearer` keyword is rejected.
fn parse_bearer_token(header_value: &str) -> Option<&str> {
    let parts: Vec<&str> = header_value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Operator gate: HTTP basic credentials must match the configured pair.
#[instrument(skip_all, name = "social.middleware.basic_auth")]
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    let (user, pass) = authorization_header(&req)
        .and_then(parse_basic_credentials)
        .ok_or_else(|| {
            tracing::debug!(target: "social.auth", "Missing or malformed basic credentials");
            record_token_validation("basic", false);
            SocialError::BasicAuthRequired
        })?;

    // Non-short-circuiting so both halves are always compared.
    let user_ok = constant_time_eq(state.config.basic_auth_user.as_bytes(), user.as_bytes());
    let pass_ok = secrets_match(&state.config.basic_auth_pass, &pass);
    if !(user_ok & pass_ok) {
        tracing::debug!(target: "social.auth", "Basic credentials rejected");
        record_token_validation("basic", false);
        return Err(SocialError::BasicAuthRequired);
    }

    record_token_validation("basic", true);
    Ok(next.run(req).await)
}

/// Bearer gate: validate the token, resolve its subject and attach
/// [`CurrentUser`] to the request.
#[instrument(skip_all, name = "social.middleware.user_auth")]
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    let header_value = authorization_header(&req).ok_or_else(|| {
        tracing::debug!(target: "social.auth", "Missing Authorization header");
        SocialError::Unauthorized("Authorization header is missing".to_string())
    })?;

    let token = parse_bearer_token(header_value).ok_or_else(|| {
        tracing::debug!(target: "social.auth", "Malformed Authorization header");
        SocialError::Unauthorized("Authorization header is malformed".to_string())
    })?;

    let claims = state.authenticator.validate_token(token)?;
    let user_id = claims
        .user_id()
        .map_err(|e| SocialError::Unauthorized(e.to_string()))?;

    let user = user_service::get_user(state.store.as_ref(), state.cache.as_ref(), user_id)
        .await
        .map_err(|e| {
            match &e {
                StoreError::NotFound => {
                    tracing::debug!(target: "social.auth", "Token subject no longer exists");
                }
                other => {
                    tracing::warn!(target: "social.auth", error = %other, "User resolution failed");
                }
            }
            SocialError::Unauthorized("The access token is invalid or expired".to_string())
        })?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
