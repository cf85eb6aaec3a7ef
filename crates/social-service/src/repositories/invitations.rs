//! Invitation repository. Tokens are stored as SHA-256 hex digests.

use crate::store::StoreError;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

pub async fn create_invitation<'e, E: PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
    user_id: i64,
    expiry: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO invitations (token, user_id, expiry)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expiry)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to create invitation", e))?;

    Ok(())
}

/// Owner of a non-expired invitation, if any.
pub async fn find_valid_user_id<'e, E: PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
) -> Result<Option<i64>, StoreError> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT user_id
        FROM invitations
        WHERE token = $1 AND expiry > NOW()
        "#,
    )
    .bind(token_hash)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to look up invitation", e))
}

pub async fn delete_by_user_id<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        r#"
        DELETE FROM invitations
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to delete invitations", e))?;

    Ok(result.rows_affected())
}
