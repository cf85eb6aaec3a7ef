//! HTTP routes for the social API.
//!
//! Defines the Axum router and application state.

use crate::auth::JwtAuthenticator;
use crate::cache::UserCache;
use crate::config::Config;
use crate::handlers;
use crate::mailer::EmailSender;
use crate::middleware::{
    http_metrics_middleware, load_post, rate_limit_middleware, require_admin_or_owner,
    require_basic_auth, require_moderator_or_owner, require_user,
};
use crate::rate_limiter::FixedWindowLimiter;
use crate::store::Store;
use axum::{
    body::Body,
    handler::Handler,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Span;

/// Upper bound on any single request, including body reads.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// How long browsers may cache a preflight answer.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(300);

/// Cross-origin policy for browser clients: any http or https origin, no
/// credentials.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin = origin.as_bytes();
            origin.starts_with(b"https://") || origin.starts_with(b"http://")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(CORS_MAX_AGE)
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Layers every response passes through, innermost first: panic recovery,
/// request tracing, then the request id (set on the way in, echoed on the
/// way out).
pub fn with_request_hardening(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Durable users, posts, comments and follows.
    pub store: Arc<dyn Store>,

    /// Read-through cache in front of user lookups.
    pub cache: Arc<dyn UserCache>,

    /// Sender for activation emails.
    pub mailer: Arc<dyn EmailSender>,

    pub authenticator: Arc<JwtAuthenticator>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        cache: Arc<dyn UserCache>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let authenticator = Arc::new(JwtAuthenticator::from_config(&config.jwt));
        Self {
            config,
            store,
            cache,
            mailer,
            authenticator,
        }
    }
}

/// Build the application routes.
///
/// - `/` and `/metrics` - public
/// - `/v1/health` - basic auth
/// - `/v1/authentication/*` and `/v1/users/activate/:token` - public
/// - `/v1/users/*` and `/v1/posts/*` - bearer auth
/// - `/v1/posts/:post_id/*` - post loaded into the request; PATCH needs owner
///   or moderator, DELETE needs owner or admin
///
/// Layers, innermost first: panic recovery, trace, request id, 30s timeout,
/// rate limiter (when enabled), CORS, HTTP metrics. CORS sits outside the
/// rate limiter and every auth gate so preflights are answered directly.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::welcome))
        .route("/v1/authentication/user", post(handlers::register_user))
        .route("/v1/authentication/token", post(handlers::create_token))
        .route(
            "/v1/users/activate/:token",
            put(handlers::activate_user).get(handlers::activate_user),
        )
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let operator_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state.clone());

    // Routes addressing a single post. `load_post` runs after `require_user`
    // (added below on the enclosing router) and before the per-method gates.
    let post_item_routes = Router::new()
        .route(
            "/v1/posts/:post_id",
            get(handlers::get_post)
                .patch(handlers::update_post.layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_moderator_or_owner,
                )))
                .delete(handlers::delete_post.layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_admin_or_owner,
                ))),
        )
        .route("/v1/posts/:post_id/comments", post(handlers::create_comment))
        .route_layer(middleware::from_fn_with_state(state.clone(), load_post));

    let protected_routes = Router::new()
        .route("/v1/users/feed", get(handlers::get_feed))
        .route("/v1/users/:user_id", get(handlers::get_user))
        .route("/v1/users/:user_id/follow", put(handlers::follow_user))
        .route("/v1/users/:user_id/unfollow", put(handlers::unfollow_user))
        .route(
            "/v1/posts",
            post(handlers::create_post).get(handlers::list_posts),
        )
        .merge(post_item_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user))
        .with_state(state.clone());

    let app = public_routes
        .merge(metrics_routes)
        .merge(operator_routes)
        .merge(protected_routes);
    let mut app = with_request_hardening(app).layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    if state.config.rate_limit.enabled {
        let limiter = FixedWindowLimiter::from_config(&state.config.rate_limit);
        app = app.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    // Preflights never reach the limiter or the auth gates. Metrics stays
    // outermost, so 429s and framework rejections are counted too.
    app.layer(cors_layer())
        .layer(middleware::from_fn(http_metrics_middleware))
}
