//! Persistence contract consumed by the services and middleware.
//!
//! [`Store`] is the seam between the API and its durable state. The production
//! implementation is [`postgres::PgStore`]; [`memory::InMemoryStore`] keeps the
//! same contract in process for tests and local runs.
//!
//! Every call either succeeds or fails with a [`StoreError`]. Missing rows are
//! reported as `StoreError::NotFound`, never as an empty success.

pub mod memory;
pub mod postgres;

use crate::models::{
    Comment, FeedQuery, NewComment, NewPost, NewUser, Post, PostChanges, PostWithMetadata, Role,
    User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on any single store call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Classify an sqlx error, keeping `context` for the log line.
    pub fn from_sqlx(context: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                StoreError::Conflict(conflict_message(constraint))
            }
            other => StoreError::Database(format!("{context}: {other}")),
        }
    }
}

fn conflict_message(constraint: &str) -> String {
    if constraint.contains("email") {
        "A user with that email already exists".to_string()
    } else if constraint.contains("username") {
        "A user with that username already exists".to_string()
    } else if constraint.contains("followers") {
        "Already following this user".to_string()
    } else {
        "Resource already exists".to_string()
    }
}

/// Run `fut`, failing with `StoreError::Timeout` if it does not finish in `limit`.
///
/// Dropping the returned future (for example when the inbound request is
/// cancelled) drops `fut` with it.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Durable store for users, roles, invitations, posts, comments and follows.
#[async_trait]
pub trait Store: Send + Sync {
    // ---- users -----------------------------------------------------------

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn get_user_by_id(&self, user_id: i64) -> Result<User, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Remove a user that has not been activated. Active users are left alone.
    async fn delete_user_by_id(&self, user_id: i64) -> Result<(), StoreError>;

    /// Mark the user behind a non-expired invitation active and consume the
    /// invitation. `NotFound` covers both unknown and expired tokens.
    async fn activate_user(&self, token_hash: &str) -> Result<(), StoreError>;

    /// Insert the user and its invitation atomically.
    async fn create_and_invite(
        &self,
        user: &NewUser,
        token_hash: &str,
        expiry: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    async fn clean_invitation_by_user_id(&self, user_id: i64) -> Result<(), StoreError>;

    // ---- roles -----------------------------------------------------------

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError>;

    /// Whether `role_id` has a level at or above `required_role`.
    async fn is_role_precedent(&self, role_id: i64, required_role: &str)
        -> Result<bool, StoreError>;

    // ---- posts -----------------------------------------------------------

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    async fn get_post_by_id(&self, post_id: i64) -> Result<Post, StoreError>;

    /// Apply `changes` if the stored version still equals `expected_version`.
    /// A stale version is reported as `NotFound`.
    async fn update_post(
        &self,
        post_id: i64,
        expected_version: i32,
        changes: &PostChanges,
    ) -> Result<Post, StoreError>;

    async fn delete_post_by_id(&self, post_id: i64) -> Result<(), StoreError>;

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostWithMetadata>, StoreError>;

    /// Posts by `user_id` and by the users it follows.
    async fn get_user_feed(
        &self,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>, StoreError>;

    // ---- comments --------------------------------------------------------

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StoreError>;

    /// Comments on a post, newest first.
    async fn get_comments_by_post_id(&self, post_id: i64) -> Result<Vec<Comment>, StoreError>;

    // ---- followers -------------------------------------------------------

    async fn follow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError>;

    async fn unfollow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError>;
}
