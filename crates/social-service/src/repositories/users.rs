//! User repository: lookup, creation, activation and removal.

use crate::models::{NewUser, User};
use crate::store::StoreError;
use sqlx::PgExecutor;

/// Insert a user and return the stored row.
pub async fn create_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user: &NewUser,
) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, role_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, username, email, password_hash, created_at, active, role_id
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role_id)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to create user", e))
}

pub async fn get_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, created_at, active, role_id
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to fetch user by id", e))?
    .ok_or(StoreError::NotFound)
}

/// Emails are matched case-insensitively.
pub async fn get_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<User, StoreError> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, created_at, active, role_id
        FROM users
        WHERE LOWER(email) = LOWER($1)
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to fetch user by email", e))?
    .ok_or(StoreError::NotFound)
}

/// Delete a user only while it is still inactive.
///
/// Returns the number of rows removed (0 or 1).
pub async fn delete_inactive<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = $1 AND active = FALSE
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to delete user", e))?;

    Ok(result.rows_affected())
}

pub async fn set_active<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET active = TRUE
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to activate user", e))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
