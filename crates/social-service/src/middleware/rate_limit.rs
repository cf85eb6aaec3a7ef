//! Per-client rate limiting in front of the whole router.
//!
//! The client key is `True-Client-IP`, then `X-Real-IP`, then the first
//! `X-Forwarded-For` entry, then the peer socket address when the server was
//! started with connect info. Rejections carry `Retry-After` in whole seconds.

use crate::errors::SocialError;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_rate_limit_decision;
use crate::rate_limiter::FixedWindowLimiter;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Duration;

const TRUE_CLIENT_IP: &str = "true-client-ip";
const REAL_IP: &str = "x-real-ip";
const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Identify the caller for rate limiting.
pub fn client_key(req: &Request) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let forwarded_first = || {
        header(FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header(TRUE_CLIENT_IP)
        .or_else(|| header(REAL_IP))
        .or_else(forwarded_first)
    {
        return ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Round up so a client never retries before its window has closed.
fn retry_after_seconds(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<FixedWindowLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    let key = client_key(&req);
    let (allowed, retry_after) = limiter.allow(&key).await;
    record_rate_limit_decision(allowed);

    if !allowed {
        tracing::warn!(
            target: "social.ratelimit",
            client = %hash_for_correlation(&key),
            retry_after_secs = retry_after.as_secs_f64(),
            "Rate limit exceeded"
        );
        return Err(SocialError::TooManyRequests {
            retry_after_seconds: retry_after_seconds(retry_after),
        });
    }

    Ok(next.run(req).await)
}
