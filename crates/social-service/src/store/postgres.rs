//! PostgreSQL-backed [`Store`].
//!
//! Statements live in `crate::repositories`; this type adds the per-call
//! timeout, transactions for the multi-statement operations, and query
//! metrics.

use super::{with_timeout, Store, StoreError};
use crate::models::{
    Comment, FeedQuery, NewComment, NewPost, NewUser, Post, PostChanges, PostWithMetadata, Role,
    User,
};
use crate::observability::metrics::record_db_query;
use crate::repositories::{comments, followers, invitations, posts, roles, users};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::instrument;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let start = Instant::now();
        let result = with_timeout(self.query_timeout, fut).await;
        let status = match &result {
            Ok(_) | Err(StoreError::NotFound) => "success",
            Err(StoreError::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        record_db_query(operation, status, start.elapsed());
        result
    }
}

fn begin_error(e: sqlx::Error) -> StoreError {
    StoreError::from_sqlx("Failed to begin transaction", e)
}

fn commit_error(e: sqlx::Error) -> StoreError {
    StoreError::from_sqlx("Failed to commit transaction", e)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        self.run("create_user", users::create_user(&self.pool, user))
            .await
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<User, StoreError> {
        self.run("get_user_by_id", users::get_by_id(&self.pool, user_id))
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.run("get_user_by_email", users::get_by_email(&self.pool, email))
            .await
    }

    async fn delete_user_by_id(&self, user_id: i64) -> Result<(), StoreError> {
        self.run("delete_user_by_id", async {
            users::delete_inactive(&self.pool, user_id).await?;
            Ok(())
        })
        .await
    }

    #[instrument(skip_all)]
    async fn activate_user(&self, token_hash: &str) -> Result<(), StoreError> {
        self.run("activate_user", async {
            let mut tx = self.pool.begin().await.map_err(begin_error)?;

            let user_id = invitations::find_valid_user_id(&mut *tx, token_hash)
                .await?
                .ok_or(StoreError::NotFound)?;
            users::set_active(&mut *tx, user_id).await?;
            invitations::delete_by_user_id(&mut *tx, user_id).await?;

            tx.commit().await.map_err(commit_error)
        })
        .await
    }

    #[instrument(skip_all)]
    async fn create_and_invite(
        &self,
        user: &NewUser,
        token_hash: &str,
        expiry: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        self.run("create_and_invite", async {
            let mut tx = self.pool.begin().await.map_err(begin_error)?;

            let created = users::create_user(&mut *tx, user).await?;
            invitations::create_invitation(&mut *tx, token_hash, created.id, expiry).await?;

            tx.commit().await.map_err(commit_error)?;
            Ok(created)
        })
        .await
    }

    async fn clean_invitation_by_user_id(&self, user_id: i64) -> Result<(), StoreError> {
        self.run("clean_invitation_by_user_id", async {
            invitations::delete_by_user_id(&self.pool, user_id).await?;
            Ok(())
        })
        .await
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError> {
        self.run("get_role_by_name", roles::get_by_name(&self.pool, name))
            .await
    }

    async fn is_role_precedent(
        &self,
        role_id: i64,
        required_role: &str,
    ) -> Result<bool, StoreError> {
        self.run(
            "is_role_precedent",
            roles::is_precedent(&self.pool, role_id, required_role),
        )
        .await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        self.run("create_post", posts::create_post(&self.pool, post))
            .await
    }

    async fn get_post_by_id(&self, post_id: i64) -> Result<Post, StoreError> {
        self.run("get_post_by_id", posts::get_by_id(&self.pool, post_id))
            .await
    }

    async fn update_post(
        &self,
        post_id: i64,
        expected_version: i32,
        changes: &PostChanges,
    ) -> Result<Post, StoreError> {
        self.run(
            "update_post",
            posts::update_versioned(&self.pool, post_id, expected_version, changes),
        )
        .await
    }

    async fn delete_post_by_id(&self, post_id: i64) -> Result<(), StoreError> {
        self.run("delete_post_by_id", posts::delete_by_id(&self.pool, post_id))
            .await
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostWithMetadata>, StoreError> {
        self.run("list_posts", posts::list(&self.pool, None, query))
            .await
    }

    async fn get_user_feed(
        &self,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>, StoreError> {
        self.run("get_user_feed", posts::list(&self.pool, Some(user_id), query))
            .await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        self.run("create_comment", comments::create_comment(&self.pool, comment))
            .await
    }

    async fn get_comments_by_post_id(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        self.run(
            "get_comments_by_post_id",
            comments::get_by_post_id(&self.pool, post_id),
        )
        .await
    }

    async fn follow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError> {
        self.run("follow", followers::follow(&self.pool, user_id, follow_id))
            .await
    }

    async fn unfollow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError> {
        self.run("unfollow", followers::unfollow(&self.pool, user_id, follow_id))
            .await
    }
}
