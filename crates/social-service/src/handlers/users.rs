//! User handlers: activation, profiles, follows and the personal feed.

use crate::errors::SocialError;
use crate::middleware::CurrentUser;
use crate::models::{PostWithMetadata, User};
use crate::routes::AppState;
use crate::services::post_service::{self, FeedQueryParams};
use crate::services::user_service;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

pub const ACTIVATED_MESSAGE: &str = "User activated successfully";

/// PUT|GET /v1/users/activate/:token
#[instrument(skip_all, name = "social.handlers.activate")]
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<&'static str>), SocialError> {
    user_service::activate_user(state.store.as_ref(), &token).await?;
    Ok((StatusCode::ACCEPTED, Json(ACTIVATED_MESSAGE)))
}

/// GET /v1/users/:user_id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, SocialError> {
    let user =
        user_service::get_profile(state.store.as_ref(), state.cache.as_ref(), user_id).await?;
    Ok(Json(user))
}

/// PUT /v1/users/:user_id/follow
pub async fn follow_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(follow_id): Path<i64>,
) -> Result<StatusCode, SocialError> {
    user_service::follow(state.store.as_ref(), &user, follow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/users/:user_id/unfollow
pub async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(follow_id): Path<i64>,
) -> Result<StatusCode, SocialError> {
    user_service::unfollow(state.store.as_ref(), &user, follow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/feed
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<FeedQueryParams>,
) -> Result<Json<Vec<PostWithMetadata>>, SocialError> {
    let feed = post_service::get_feed(state.store.as_ref(), &user, &params).await?;
    Ok(Json(feed))
}
