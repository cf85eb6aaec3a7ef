//! Redis-backed [`UserCache`].
//!
//! # Key Patterns
//!
//! - `user:{id}` - JSON-encoded [`CachedUser`], written with `SET .. EX ttl`
//!
//! The `ConnectionManager` reconnects on its own and is cheap to clone, so
//! each call clones it instead of sharing it behind a lock.

use super::{user_key, CacheError, CachedUser, UserCache};
use crate::models::User;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{instrument, warn};

/// Upper bound on a single cache round trip.
const CACHE_OP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct RedisUserCache {
    connection: ConnectionManager,
    ttl: Duration,
}

impl RedisUserCache {
    /// Connect to `redis_url` (e.g. `redis://localhost:6379/0`).
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the URL is invalid or the first
    /// connection attempt fails.
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        // The URL may carry a password; never log it.
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Backend(format!("Failed to open Redis client: {e}")))?;

        let connection = tokio::time::timeout(CACHE_OP_TIMEOUT, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| CacheError::Backend(format!("Failed to connect to Redis: {e}")))?;

        Ok(Self { connection, ttl })
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    #[instrument(skip_all, fields(user_id = user_id))]
    async fn get(&self, user_id: i64) -> Result<Option<User>, CacheError> {
        let mut conn = self.connection.clone();
        let key = user_key(user_id);

        let raw: Option<String> = tokio::time::timeout(CACHE_OP_TIMEOUT, conn.get(&key))
            .await
            .map_err(|_| CacheError::Timeout)?
            .map_err(|e| {
                warn!(target: "social.cache.redis", error = %e, "Failed to read cached user");
                CacheError::Backend(format!("GET {key} failed: {e}"))
            })?;

        match raw {
            Some(json) => {
                let cached: CachedUser = serde_json::from_str(&json)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(cached.into()))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(user_id = user.id))]
    async fn set(&self, user: &User) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let key = user_key(user.id);
        let json = serde_json::to_string(&CachedUser::from(user))
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        tokio::time::timeout(
            CACHE_OP_TIMEOUT,
            conn.set_ex::<_, _, ()>(&key, json, self.ttl.as_secs()),
        )
        .await
        .map_err(|_| CacheError::Timeout)?
        .map_err(|e| {
            warn!(target: "social.cache.redis", error = %e, "Failed to write cached user");
            CacheError::Backend(format!("SET {key} failed: {e}"))
        })
    }
}
