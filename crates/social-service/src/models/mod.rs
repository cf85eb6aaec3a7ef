//! Data models shared by the store, the cache and the HTTP handlers.
//!
//! `User` is the canonical identity record. Its password hash never leaves the
//! process in an API response; the cache keeps its own snapshot type
//! (`crate::cache::CachedUser`) that does carry it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default role assigned at registration.
pub const DEFAULT_ROLE: &str = "user";

/// User record (maps to the `users` table).
#[derive(Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub role_id: i64,
    /// Plaintext activation token; only populated in the registration response.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_token: Option<String>,
}

/// Custom Debug implementation that redacts the email and password hash.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &"[REDACTED]")
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("active", &self.active)
            .field("role_id", &self.role_id)
            .finish()
    }
}

/// Fields needed to insert a user.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
}

/// Role with a precedence level; higher levels include lower ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub description: String,
}

/// Pending activation for a registered user. Only the SHA-256 hex digest of
/// the token is stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Invitation {
    pub token: String,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
}

/// Post record (maps to the `posts` table).
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub tags: Vec<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub tags: Vec<String>,
}

/// Replacement values for an update guarded by `version`.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Feed entry: a post with its author name and comment count.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PostWithMetadata {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub comments_count: i64,
}

/// Comment record joined with its author's username.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

/// Sort direction for feeds, by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated pagination and filter options for feed and post listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: i64,
    pub offset: i64,
    pub sort: SortOrder,
    pub search: String,
    pub tags: Vec<String>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            sort: SortOrder::Desc,
            search: String::new(),
            tags: Vec::new(),
        }
    }
}

impl FeedQuery {
    /// Whether `post` passes the search and tag filters.
    pub fn matches(&self, title: &str, content: &str, tags: &[String]) -> bool {
        let search = self.search.to_lowercase();
        let search_ok = search.is_empty()
            || title.to_lowercase().contains(&search)
            || content.to_lowercase().contains(&search);
        let tags_ok = self.tags.iter().all(|wanted| tags.contains(wanted));
        search_ok && tags_ok
    }
}
