//! Post repository: CRUD with optimistic concurrency and feed queries.

use crate::models::{FeedQuery, NewPost, Post, PostChanges, PostWithMetadata};
use crate::store::StoreError;
use sqlx::PgExecutor;

pub async fn create_post<'e, E: PgExecutor<'e>>(
    executor: E,
    post: &NewPost,
) -> Result<Post, StoreError> {
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, content, user_id, tags)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, content, user_id, tags, version, created_at, updated_at
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(post.user_id)
    .bind(&post.tags)
    .fetch_one(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to create post", e))
}

pub async fn get_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
) -> Result<Post, StoreError> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, user_id, tags, version, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to fetch post", e))?
    .ok_or(StoreError::NotFound)
}

/// Update guarded by `version`; a concurrent edit makes this return `NotFound`.
pub async fn update_versioned<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
    expected_version: i32,
    changes: &PostChanges,
) -> Result<Post, StoreError> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $1, content = $2, tags = $3, updated_at = NOW(), version = version + 1
        WHERE id = $4 AND version = $5
        RETURNING id, title, content, user_id, tags, version, created_at, updated_at
        "#,
    )
    .bind(&changes.title)
    .bind(&changes.content)
    .bind(&changes.tags)
    .bind(post_id)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to update post", e))?
    .ok_or(StoreError::NotFound)
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    post_id: i64,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        DELETE FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .execute(executor)
    .await
    .map_err(|e| StoreError::from_sqlx("Failed to delete post", e))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Posts matching `query`. With `feed_owner` set, only posts by that user and
/// the users it follows are returned.
/// `ILIKE` pattern matching `search` anywhere, with its own wildcards escaped.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn list<'e, E: PgExecutor<'e>>(
    executor: E,
    feed_owner: Option<i64>,
    query: &FeedQuery,
) -> Result<Vec<PostWithMetadata>, StoreError> {
    let direction = query.sort.as_sql();
    let sql = format!(
        r#"
        SELECT
            p.id, p.user_id, p.title, p.content, p.tags, p.version, p.created_at,
            u.username,
            COUNT(c.id) AS comments_count
        FROM posts p
        JOIN users u ON u.id = p.user_id
        LEFT JOIN comments c ON c.post_id = p.id
        WHERE
            ($1::BIGINT IS NULL OR p.user_id = $1 OR p.user_id IN (
                SELECT follow_id FROM followers WHERE user_id = $1
            ))
            AND ($4 = '' OR p.title ILIKE $6 ESCAPE '\' OR p.content ILIKE $6 ESCAPE '\')
            AND (cardinality($5::TEXT[]) = 0 OR p.tags @> $5::TEXT[])
        GROUP BY p.id, u.username
        ORDER BY p.created_at {direction}, p.id {direction}
        LIMIT $2 OFFSET $3
        "#
    );

    sqlx::query_as::<_, PostWithMetadata>(&sql)
        .bind(feed_owner)
        .bind(query.limit)
        .bind(query.offset)
        .bind(&query.search)
        .bind(&query.tags)
        .bind(contains_pattern(&query.search))
        .fetch_all(executor)
        .await
        .map_err(|e| StoreError::from_sqlx("Failed to list posts", e))
}
