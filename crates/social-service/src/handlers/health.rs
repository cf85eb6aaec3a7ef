//! Root, health and metrics handlers.
//!
//! - `/`: plain welcome text, no auth
//! - `/v1/health`: operator health report behind basic auth
//! - `/metrics`: Prometheus scrape endpoint

use crate::routes::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub env: String,
    pub version: &'static str,
}

pub async fn welcome() -> &'static str {
    "welcome"
}

/// Liveness report. Does not touch the store or cache.
#[tracing::instrument(skip_all, name = "social.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        env: state.config.env.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Render the process-wide Prometheus registry.
#[tracing::instrument(skip_all, name = "social.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
