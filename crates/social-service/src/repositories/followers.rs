//! Follow relationships: a row `(user_id, follow_id)` means `user_id` follows `follow_id`.

use crate::store::StoreError;
use sqlx::PgExecutor;

pub async fn follow<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    follow_id: i64,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO followers (user_id, follow_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(follow_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to follow user", e))?;

    Ok(())
}

/// Unfollowing someone not followed is a no-op.
pub async fn unfollow<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    follow_id: i64,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        DELETE FROM followers
        WHERE user_id = $1 AND follow_id = $2
        "#,
    )
    .bind(user_id)
    .bind(follow_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to unfollow user", e))?;

    Ok(())
}
