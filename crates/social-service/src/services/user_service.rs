//! User lookups, activation and follows.

use crate::cache::UserCache;
use crate::crypto;
use crate::errors::SocialError;
use crate::models::User;
use crate::observability::metrics::record_cache_lookup;
use crate::store::{Store, StoreError};
use tracing::instrument;

/// Resolve a user through the cache, falling back to the store.
///
/// Cache errors never fail the lookup: a failed read falls through to the
/// store and a failed write-back is only logged. Store errors, including
/// `NotFound`, are returned as-is for the caller to map.
#[instrument(skip_all, fields(user_id = user_id))]
pub async fn get_user(
    store: &dyn Store,
    cache: &dyn UserCache,
    user_id: i64,
) -> Result<User, StoreError> {
    match cache.get(user_id).await {
        Ok(Some(user)) => {
            record_cache_lookup("hit");
            return Ok(user);
        }
        Ok(None) => record_cache_lookup("miss"),
        Err(e) => {
            record_cache_lookup("error");
            tracing::warn!(target: "social.cache", error = %e, "Cache read failed, using store");
        }
    }

    let user = store.get_user_by_id(user_id).await?;

    if let Err(e) = cache.set(&user).await {
        tracing::warn!(target: "social.cache", error = %e, "Cache write failed");
    }

    Ok(user)
}

/// Activate the account behind a plaintext invitation token.
///
/// Unknown, expired and already-used tokens are all `NotFound`.
#[instrument(skip_all)]
pub async fn activate_user(store: &dyn Store, token: &str) -> Result<(), SocialError> {
    let token_hash = crypto::hash_token(token);

    store
        .activate_user(&token_hash)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => {
                SocialError::NotFound("Invitation not found or expired".to_string())
            }
            other => other.into(),
        })?;

    tracing::info!(target: "social.registration", "User activated");
    Ok(())
}

/// Public profile lookup for `GET /v1/users/:id`.
pub async fn get_profile(
    store: &dyn Store,
    cache: &dyn UserCache,
    user_id: i64,
) -> Result<User, SocialError> {
    get_user(store, cache, user_id).await.map_err(|e| match e {
        StoreError::NotFound => SocialError::NotFound("User not found".to_string()),
        other => other.into(),
    })
}

#[instrument(skip_all, fields(user_id = follower.id, follow_id = follow_id))]
pub async fn follow(store: &dyn Store, follower: &User, follow_id: i64) -> Result<(), SocialError> {
    if follower.id == follow_id {
        return Err(SocialError::BadRequest("Cannot follow yourself".to_string()));
    }

    store.follow(follower.id, follow_id).await.map_err(|e| match e {
        StoreError::NotFound => SocialError::NotFound("User not found".to_string()),
        other => other.into(),
    })
}

#[instrument(skip_all, fields(user_id = follower.id, follow_id = follow_id))]
pub async fn unfollow(
    store: &dyn Store,
    follower: &User,
    follow_id: i64,
) -> Result<(), SocialError> {
    store.unfollow(follower.id, follow_id).await?;
    Ok(())
}
