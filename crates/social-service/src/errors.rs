//! Social API error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Messages
//! returned to clients for store, mail and hashing failures are generic; the
//! underlying cause is logged server-side.

use crate::cache::CacheError;
use crate::mailer::MailError;
use crate::store::StoreError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// `WWW-Authenticate` challenge sent by the operator (basic auth) gate.
pub const BASIC_AUTH_CHALLENGE: &str = "Basic realm=\"Restricted\"";

/// `WWW-Authenticate` challenge sent for bearer-protected routes.
pub const BEARER_AUTH_CHALLENGE: &str = "Bearer realm=\"social-api\"";

/// Social API error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400
/// - Unauthorized, InvalidToken, BasicAuthRequired: 401
/// - Forbidden: 403
/// - NotFound: 404
/// - Conflict: 409
/// - TooManyRequests: 429
/// - Database, Mail, Internal: 500
/// - ServiceUnavailable: 503
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Basic authentication required")]
    BasicAuthRequired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests, retry after {retry_after_seconds}s")]
    TooManyRequests { retry_after_seconds: u64 },

    #[error("Mail delivery error: {0}")]
    Mail(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SocialError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            SocialError::BadRequest(_) => 400,
            SocialError::Unauthorized(_)
            | SocialError::InvalidToken(_)
            | SocialError::BasicAuthRequired => 401,
            SocialError::Forbidden(_) => 403,
            SocialError::NotFound(_) => 404,
            SocialError::Conflict(_) => 409,
            SocialError::TooManyRequests { .. } => 429,
            SocialError::Database(_) | SocialError::Mail(_) | SocialError::Internal(_) => 500,
            SocialError::ServiceUnavailable(_) => 503,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for SocialError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            SocialError::Database(err) => {
                tracing::error!(target: "social.store", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            SocialError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            SocialError::Unauthorized(reason) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", reason.clone())
            }
            SocialError::InvalidToken(reason) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", reason.clone())
            }
            SocialError::BasicAuthRequired => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid operator credentials".to_string(),
            ),
            SocialError::Forbidden(reason) => (StatusCode::FORBIDDEN, "FORBIDDEN", reason.clone()),
            SocialError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", resource.clone())
            }
            SocialError::Conflict(reason) => (StatusCode::CONFLICT, "CONFLICT", reason.clone()),
            SocialError::TooManyRequests { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "Too many requests. Please try again later.".to_string(),
            ),
            SocialError::Mail(err) => {
                tracing::error!(target: "social.mailer", error = %err, "Mail delivery failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MAIL_ERROR",
                    "The activation email could not be sent".to_string(),
                )
            }
            SocialError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "social.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            SocialError::Internal(err) => {
                tracing::error!(target: "social.internal", error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        match &self {
            SocialError::BasicAuthRequired => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_AUTH_CHALLENGE),
                );
            }
            SocialError::Unauthorized(_) | SocialError::InvalidToken(_) => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BEARER_AUTH_CHALLENGE),
                );
            }
            SocialError::TooManyRequests {
                retry_after_seconds,
            } => {
                if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
            }
            _ => {}
        }

        response
    }
}

/// Store errors keep `NotFound` and `Conflict` distinct; everything else is a
/// database failure from the client's point of view.
impl From<StoreError> for SocialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => SocialError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(reason) => SocialError::Conflict(reason),
            StoreError::Timeout(_) | StoreError::Database(_) => {
                SocialError::Database(err.to_string())
            }
        }
    }
}

impl From<MailError> for SocialError {
    fn from(err: MailError) -> Self {
        SocialError::Mail(err.to_string())
    }
}

impl From<CacheError> for SocialError {
    fn from(err: CacheError) -> Self {
        SocialError::Internal(err.to_string())
    }
}
