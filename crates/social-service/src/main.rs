//! Social API
//!
//! Entry point for the social API server: users, posts, comments and
//! follows behind JWT authentication and per-client rate limiting.

use social_service::cache::{NoopUserCache, RedisUserCache, UserCache};
use social_service::config::Config;
use social_service::mailer::SmtpEmailSender;
use social_service::observability::metrics::init_metrics_recorder;
use social_service::routes::{self, AppState};
use social_service::store::postgres::PgStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "social_service=debug,social_api=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Social API");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        env = %config.env,
        bind_address = %config.bind_address,
        external_url = %config.external_url,
        rate_limit_enabled = config.rate_limit.enabled,
        redis_enabled = config.redis_enabled,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    info!("Connecting to database...");
    let db_url = add_query_timeout(&config.database_url, config.db_query_timeout.as_secs());
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_open_conns)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(config.db_max_idle_time)
        .connect(&db_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;
    info!("Database connection established");

    let store = Arc::new(PgStore::new(db_pool, config.db_query_timeout));
    let cache = build_cache(&config).await;
    let mailer = Arc::new(SmtpEmailSender::new(&config.mail).map_err(|e| {
        error!("Failed to configure mail transport: {}", e);
        e
    })?);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let drain = config.drain;

    let state = Arc::new(AppState::new(config, store, cache, mailer));
    let app = routes::build_routes(state, metrics_handle);

    info!("Social API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain))
    .await?;

    info!("Social API shutdown complete");

    Ok(())
}

/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Redis when enabled and reachable, otherwise no caching at all.
async fn build_cache(config: &Config) -> Arc<dyn UserCache> {
    if !config.redis_enabled {
        info!("User cache disabled");
        return Arc::new(NoopUserCache);
    }

    match RedisUserCache::connect(&config.redis_addr, config.cache_ttl).await {
        Ok(cache) => {
            info!("Connected to Redis user cache");
            Arc::new(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, continuing without user cache");
            Arc::new(NoopUserCache)
        }
    }
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and the drain period is complete.
async fn shutdown_signal(drain: Duration) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if drain.is_zero() {
        info!("Skipping drain period (DRAIN_SECONDS=0)");
    } else {
        warn!("Draining connections for {} seconds...", drain.as_secs());
        tokio::time::sleep(drain).await;
        info!("Drain period complete");
    }
}

/// Adds statement_timeout to the database URL so a stuck query is cancelled
/// server-side as well.
fn add_query_timeout(url: &str, timeout_secs: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}options=-c%20statement_timeout%3D{timeout_secs}s")
}
