//! In-process [`UserCache`] with per-entry expiry.

use super::{CacheError, CachedUser, UserCache, DEFAULT_USER_CACHE_TTL};
use crate::models::User;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry {
    user: CachedUser,
    expires_at: Instant,
}

/// `HashMap`-backed cache. Expiry follows the tokio clock, so tests can
/// drive it with `tokio::time::advance`.
pub struct MemoryUserCache {
    entries: Mutex<HashMap<i64, Entry>>,
    ttl: Duration,
    failing: AtomicBool,
}

impl Default for MemoryUserCache {
    fn default() -> Self {
        Self::new(DEFAULT_USER_CACHE_TTL)
    }
}

impl MemoryUserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every `get` and `set` fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, user_id: i64) -> Result<Option<User>, CacheError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if entries.get(&user_id).is_some_and(|e| e.expires_at <= now) {
            entries.remove(&user_id);
            return Ok(None);
        }
        Ok(entries.get(&user_id).map(|e| User::from(e.user.clone())))
    }

    async fn set(&self, user: &User) -> Result<(), CacheError> {
        self.check()?;
        let entry = Entry {
            user: CachedUser::from(user),
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().await.insert(user.id, entry);
        Ok(())
    }
}
