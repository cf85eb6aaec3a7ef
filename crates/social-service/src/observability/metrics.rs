//! Metric definitions for the social API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `social_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: 7 values max
//! - `endpoint`: route templates only (`/v1/posts/{id}`), never raw ids
//! - `status`: success, error, timeout
//! - `operation`: store method names, fixed by code
//! - `outcome` / `step`: fixed by code

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle that renders
/// `/metrics`.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("social_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("social_db_query".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.020, 0.050, 0.100, 0.250, 0.500, 1.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set DB query buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `social_http_requests_total`, `social_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("social_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("social_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Collapse ids and tokens in a request path into route templates.
fn normalize_endpoint(path: &str) -> String {
    let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();

    let normalized = match parts.as_slice() {
        [""] => "/",
        ["", "metrics"] => "/metrics",
        ["", "v1", "health"] => "/v1/health",
        ["", "v1", "authentication", "user"] => "/v1/authentication/user",
        ["", "v1", "authentication", "token"] => "/v1/authentication/token",
        ["", "v1", "users", "feed"] => "/v1/users/feed",
        ["", "v1", "users", "activate", _] => "/v1/users/activate/{token}",
        ["", "v1", "users", _] => "/v1/users/{id}",
        ["", "v1", "users", _, "follow"] => "/v1/users/{id}/follow",
        ["", "v1", "users", _, "unfollow"] => "/v1/users/{id}/unfollow",
        ["", "v1", "posts"] => "/v1/posts",
        ["", "v1", "posts", _] => "/v1/posts/{id}",
        ["", "v1", "posts", _, "comments"] => "/v1/posts/{id}/comments",
        _ => "/other",
    };
    normalized.to_string()
}

// ============================================================================
// Rate Limiter Metrics
// ============================================================================

/// Metric: `social_rate_limit_decisions_total`
/// Labels: `decision` (allowed, rejected)
pub fn record_rate_limit_decision(allowed: bool) {
    let decision = if allowed { "allowed" } else { "rejected" };
    counter!("social_rate_limit_decisions_total",
        "decision" => decision
    )
    .increment(1);
}

// ============================================================================
// Cache Metrics
// ============================================================================

/// Metric: `social_cache_lookups_total`
/// Labels: `result` (hit, miss, error)
pub fn record_cache_lookup(result: &'static str) {
    counter!("social_cache_lookups_total",
        "result" => result
    )
    .increment(1);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Metric: `social_token_validations_total`
/// Labels: `scheme` (bearer, basic), `status` (success, error)
pub fn record_token_validation(scheme: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!("social_token_validations_total",
        "scheme" => scheme,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Registration Metrics
// ============================================================================

/// Metric: `social_registrations_total`
/// Labels: `outcome` (success, invalid, conflict, mail_failed, error)
pub fn record_registration(outcome: &'static str) {
    counter!("social_registrations_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Metric: `social_registration_compensations_total`
/// Labels: `step` (delete_user, clean_invitations), `status`
pub fn record_compensation(step: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!("social_registration_compensations_total",
        "step" => step,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Database Metrics
// ============================================================================

/// Record store call execution.
///
/// Metric: `social_db_query_duration_seconds`, `social_db_queries_total`
/// Labels: `operation`, `status`
pub fn record_db_query(operation: &str, status: &str, duration: Duration) {
    histogram!("social_db_query_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("social_db_queries_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
