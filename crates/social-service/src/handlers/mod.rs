//! HTTP request handlers for the social API.

pub mod auth_handler;
pub mod health;
pub mod posts;
pub mod users;

pub use auth_handler::{create_token, register_user};
pub use health::{health_check, metrics_handler, welcome};
pub use posts::{create_comment, create_post, delete_post, get_post, list_posts, update_post};
pub use users::{activate_user, follow_user, get_feed, get_user, unfollow_user};
