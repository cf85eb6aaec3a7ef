//! Posts, comments and feeds.

use crate::errors::SocialError;
use crate::models::{
    Comment, FeedQuery, NewComment, NewPost, Post, PostChanges, PostWithMetadata, SortOrder, User,
};
use crate::services::validation::{check_length, check_max_length};
use crate::store::{Store, StoreError};
use serde::Deserialize;
use tracing::instrument;

pub const MAX_FEED_LIMIT: i64 = 100;
pub const MAX_SEARCH_LENGTH: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        check_length("title", &self.title, 2, 100)?;
        check_length("content", &self.content, 2, 1000)?;
        Ok(())
    }
}

/// Partial update; absent or empty fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            check_length("title", title, 2, 100)?;
        }
        if let Some(content) = self.content.as_deref().filter(|c| !c.is_empty()) {
            check_length("content", content, 2, 1000)?;
        }
        Ok(())
    }

    fn apply_to(&self, post: &Post) -> PostChanges {
        PostChanges {
            title: non_empty(self.title.as_deref()).unwrap_or(&post.title).to_string(),
            content: non_empty(self.content.as_deref())
                .unwrap_or(&post.content)
                .to_string(),
            tags: self.tags.clone().unwrap_or_else(|| post.tags.clone()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(&self) -> Result<(), SocialError> {
        check_length("content", &self.content, 1, 1000)
    }
}

/// Raw listing query string. Fields are strings so that malformed values
/// surface as a 400 with a field name instead of a generic rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQueryParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
}

impl FeedQueryParams {
    pub fn parse(&self) -> Result<FeedQuery, SocialError> {
        let mut query = FeedQuery::default();

        if let Some(raw) = non_empty(self.limit.as_deref()) {
            query.limit = raw
                .parse()
                .ok()
                .filter(|limit| (1..=MAX_FEED_LIMIT).contains(limit))
                .ok_or_else(|| {
                    SocialError::BadRequest(format!(
                        "limit must be an integer between 1 and {MAX_FEED_LIMIT}"
                    ))
                })?;
        }

        if let Some(raw) = non_empty(self.offset.as_deref()) {
            query.offset = raw
                .parse()
                .ok()
                .filter(|offset| *offset >= 0)
                .ok_or_else(|| {
                    SocialError::BadRequest("offset must be a non-negative integer".to_string())
                })?;
        }

        if let Some(raw) = non_empty(self.sort.as_deref()) {
            query.sort = match raw.to_ascii_lowercase().as_str() {
                "asc" => SortOrder::Asc,
                "desc" => SortOrder::Desc,
                _ => {
                    return Err(SocialError::BadRequest(
                        "sort must be 'asc' or 'desc'".to_string(),
                    ))
                }
            };
        }

        if let Some(search) = self.search.as_deref() {
            check_max_length("search", search, MAX_SEARCH_LENGTH)?;
            query.search = search.to_string();
        }

        if let Some(tags) = self.tags.as_deref() {
            query.tags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(query)
    }
}

#[instrument(skip_all, fields(user_id = author.id))]
pub async fn create_post(
    store: &dyn Store,
    author: &User,
    request: CreatePostRequest,
) -> Result<Post, SocialError> {
    request.validate()?;

    let post = store
        .create_post(&NewPost {
            title: request.title,
            content: request.content,
            user_id: author.id,
            tags: request.tags,
        })
        .await?;

    Ok(post)
}

/// Attach the post's comments, newest first.
#[instrument(skip_all, fields(post_id = post.id))]
pub async fn with_comments(store: &dyn Store, mut post: Post) -> Result<Post, SocialError> {
    post.comments = store.get_comments_by_post_id(post.id).await?;
    Ok(post)
}

/// Apply `request` on top of `post`, guarded by the version it was read at.
///
/// A concurrent writer that got there first makes this a `Conflict`.
#[instrument(skip_all, fields(post_id = post.id))]
pub async fn update_post(
    store: &dyn Store,
    post: &Post,
    request: &UpdatePostRequest,
) -> Result<Post, SocialError> {
    request.validate()?;

    store
        .update_post(post.id, post.version, &request.apply_to(post))
        .await
        .map_err(|e| match e {
            StoreError::NotFound => {
                SocialError::Conflict("Post was modified by another request".to_string())
            }
            other => other.into(),
        })
}

#[instrument(skip_all, fields(post_id = post_id))]
pub async fn delete_post(store: &dyn Store, post_id: i64) -> Result<(), SocialError> {
    store.delete_post_by_id(post_id).await.map_err(|e| match e {
        StoreError::NotFound => SocialError::NotFound("Post not found".to_string()),
        other => other.into(),
    })
}

#[instrument(skip_all, fields(post_id = post_id, user_id = author.id))]
pub async fn create_comment(
    store: &dyn Store,
    post_id: i64,
    author: &User,
    request: CreateCommentRequest,
) -> Result<Comment, SocialError> {
    request.validate()?;

    store
        .create_comment(&NewComment {
            post_id,
            user_id: author.id,
            content: request.content,
        })
        .await
        .map_err(|e| match e {
            StoreError::NotFound => SocialError::NotFound("Post not found".to_string()),
            other => other.into(),
        })
}

pub async fn list_posts(
    store: &dyn Store,
    params: &FeedQueryParams,
) -> Result<Vec<PostWithMetadata>, SocialError> {
    let query = params.parse()?;
    Ok(store.list_posts(&query).await?)
}

/// Posts by `user` and the users it follows.
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_feed(
    store: &dyn Store,
    user: &User,
    params: &FeedQueryParams,
) -> Result<Vec<PostWithMetadata>, SocialError> {
    let query = params.parse()?;
    Ok(store.get_user_feed(user.id, &query).await?)
}
