//! HTTP middleware for the social API.
//!
//! # Components
//!
//! - `auth` - Basic gate for operator endpoints, bearer gate resolving the current user
//! - `posts` - Post loading and the ownership/role gates
//! - `rate_limit` - Per-client fixed-window admission
//! - `http_metrics` - HTTP request metrics

pub mod auth;
pub mod http_metrics;
pub mod posts;
pub mod rate_limit;

pub use auth::{require_basic_auth, require_user, CurrentUser};
pub use http_metrics::http_metrics_middleware;
pub use posts::{load_post, require_admin_or_owner, require_moderator_or_owner, PostContext};
pub use rate_limit::rate_limit_middleware;
