//! Post and comment handlers.
//!
//! Every `/v1/posts/:post_id` handler receives the post through
//! [`PostContext`]; the path is only parsed by the loading middleware.

use crate::errors::SocialError;
use crate::middleware::{CurrentUser, PostContext};
use crate::models::{Comment, Post, PostWithMetadata};
use crate::routes::AppState;
use crate::services::post_service::{
    self, CreateCommentRequest, CreatePostRequest, FeedQueryParams, UpdatePostRequest,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /v1/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), SocialError> {
    let post = post_service::create_post(state.store.as_ref(), &user, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /v1/posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQueryParams>,
) -> Result<Json<Vec<PostWithMetadata>>, SocialError> {
    let posts = post_service::list_posts(state.store.as_ref(), &params).await?;
    Ok(Json(posts))
}

/// GET /v1/posts/:post_id
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    PostContext(post): PostContext,
) -> Result<Json<Post>, SocialError> {
    let post = post_service::with_comments(state.store.as_ref(), post).await?;
    Ok(Json(post))
}

/// PATCH /v1/posts/:post_id
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    PostContext(post): PostContext,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, SocialError> {
    let updated = post_service::update_post(state.store.as_ref(), &post, &payload).await?;
    Ok(Json(updated))
}

/// DELETE /v1/posts/:post_id
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    PostContext(post): PostContext,
) -> Result<StatusCode, SocialError> {
    post_service::delete_post(state.store.as_ref(), post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/posts/:post_id/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    PostContext(post): PostContext,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), SocialError> {
    let comment = post_service::create_comment(state.store.as_ref(), post.id, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
