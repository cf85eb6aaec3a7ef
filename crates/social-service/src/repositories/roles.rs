//! Role repository.

use crate::models::Role;
use crate::store::StoreError;
use sqlx::PgExecutor;

pub async fn get_by_name<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<Role, StoreError> {
    sqlx::query_as::<_, Role>(
        r#"
        SELECT id, name, level, description
        FROM roles
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to fetch role", e))?
    .ok_or(StoreError::NotFound)
}

/// An unknown `required_role` never grants precedence.
pub async fn is_precedent<'e, E: PgExecutor<'e>>(
    executor: E,
    role_id: i64,
    required_role: &str,
) -> Result<bool, StoreError> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM roles
            WHERE id = $1 AND level >= (
                SELECT level FROM roles WHERE name = $2
            )
        )
        "#,
    )
    .bind(role_id)
    .bind(required_role)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to check role precedence", e))
}
