//! Comment repository.

use crate::models::{Comment, NewComment};
use crate::store::StoreError;
use sqlx::PgExecutor;

pub async fn create_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment: &NewComment,
) -> Result<Comment, StoreError> {
    sqlx::query_as::<_, Comment>(
        r#"
        WITH inserted AS (
            INSERT INTO comments (post_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, post_id, user_id, content, created_at
        )
        SELECT i.id, i.post_id, i.user_id, i.content, i.created_at, u.username
        FROM inserted i
        JOIN users u ON u.id = i.user_id
        "#,
    )
    .bind(comment.post_id)
    .bind(comment.user_id)
    .bind(&comment.content)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to create comment", e))
}

pub async fn get_by_post_id<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
) -> Result<Vec<Comment>, StoreError> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, u.username
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to fetch comments", e))
}
