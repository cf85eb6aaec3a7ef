//! Read-through credential cache for user lookups.
//!
//! A miss is `Ok(None)`, never an error. Entries expire after a fixed TTL and
//! are not invalidated when the stored user changes, so reads can be stale
//! until the entry expires.
//!
//! Callers compose the read-through themselves (see
//! `services::user_service::get_user`): on a miss they fetch from the store
//! and write the result back, logging rather than propagating cache errors.

pub mod memory;
pub mod redis;

use crate::models::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use memory::MemoryUserCache;
pub use redis::RedisUserCache;

/// Default lifetime of a cached user.
pub const DEFAULT_USER_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache serialization error: {0}")]
    Serialization(String),

    #[error("cache operation timed out")]
    Timeout,
}

/// Cache key for a user id.
pub fn user_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

/// Snapshot of a user at cache-write time.
///
/// Unlike the API `User`, this serializes the password hash, so it must only
/// ever be written to the cache backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub role_id: i64,
    pub activation_token: Option<String>,
}

impl From<&User> for CachedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
            active: user.active,
            role_id: user.role_id,
            activation_token: user.activation_token.clone(),
        }
    }
}

impl From<CachedUser> for User {
    fn from(cached: CachedUser) -> Self {
        Self {
            id: cached.id,
            username: cached.username,
            email: cached.email,
            password_hash: cached.password_hash,
            created_at: cached.created_at,
            active: cached.active,
            role_id: cached.role_id,
            activation_token: cached.activation_token,
        }
    }
}

/// Credential cache contract.
#[async_trait]
pub trait UserCache: Send + Sync {
    /// Cached snapshot for `user_id`; `Ok(None)` on a miss or expired entry.
    async fn get(&self, user_id: i64) -> Result<Option<User>, CacheError>;

    /// Store a snapshot of `user` for the cache TTL.
    async fn set(&self, user: &User) -> Result<(), CacheError>;
}

/// Cache used when caching is disabled: every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUserCache;

#[async_trait]
impl UserCache for NoopUserCache {
    async fn get(&self, _user_id: i64) -> Result<Option<User>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _user: &User) -> Result<(), CacheError> {
        Ok(())
    }
}
