//! Post loading and the ownership/role gates for `/v1/posts/:post_id`.
//!
//! [`load_post`] runs first and attaches a [`PostContext`]; the gates and the
//! handlers read it from there instead of loading the post again.

use crate::errors::SocialError;
use crate::middleware::auth::CurrentUser;
use crate::models::{Post, User};
use crate::routes::AppState;
use crate::store::{Store, StoreError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Role allowed to edit posts it does not own.
pub const EDIT_ROLE: &str = "moderator";

/// Role allowed to delete posts it does not own.
pub const DELETE_ROLE: &str = "admin";

/// The post addressed by the request path, inserted by [`load_post`].
#[derive(Debug, Clone)]
pub struct PostContext(pub Post);

#[async_trait]
impl<S> FromRequestParts<S> for PostContext
where
    S: Send + Sync,
{
    type Rejection = SocialError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<PostContext>().cloned().ok_or_else(|| {
            SocialError::Internal("PostContext requested on a route without load_post".to_string())
        })
    }
}

#[instrument(skip_all, name = "social.middleware.load_post")]
pub async fn load_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
    mut req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    let post = state
        .store
        .get_post_by_id(post_id)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => SocialError::NotFound("Post not found".to_string()),
            other => other.into(),
        })?;

    req.extensions_mut().insert(PostContext(post));
    Ok(next.run(req).await)
}

/// Decide whether `user` may act on `post` when the action needs `required_role`.
///
/// The owner always may. Otherwise the user's role must be at or above
/// `required_role`. A failed role lookup rejects with 401.
pub async fn authorize_post_access(
    store: &dyn Store,
    user: &User,
    post: &Post,
    required_role: &str,
) -> Result<(), SocialError> {
    if post.user_id == user.id {
        return Ok(());
    }

    match store.is_role_precedent(user.role_id, required_role).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(
                target: "social.auth",
                user_id = user.id,
                post_id = post.id,
                required_role = required_role,
                "Insufficient role for post"
            );
            Err(SocialError::Forbidden(
                "You do not have permission to modify this post".to_string(),
            ))
        }
        Err(e) => {
            tracing::warn!(target: "social.auth", error = %e, "Role lookup failed");
            Err(SocialError::Unauthorized(
                "Unable to verify permissions".to_string(),
            ))
        }
    }
}

async fn gate(
    state: &AppState,
    req: Request,
    next: Next,
    required_role: &str,
) -> Result<Response, SocialError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .map(|c| c.0.clone())
        .ok_or_else(|| SocialError::Internal("post gate without require_user".to_string()))?;
    let post = req
        .extensions()
        .get::<PostContext>()
        .map(|c| c.0.clone())
        .ok_or_else(|| SocialError::Internal("post gate without load_post".to_string()))?;

    authorize_post_access(state.store.as_ref(), &user, &post, required_role).await?;
    Ok(next.run(req).await)
}

#[instrument(skip_all, name = "social.middleware.require_moderator_or_owner")]
pub async fn require_moderator_or_owner(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    gate(&state, req, next, EDIT_ROLE).await
}

#[instrument(skip_all, name = "social.middleware.require_admin_or_owner")]
pub async fn require_admin_or_owner(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, SocialError> {
    gate(&state, req, next, DELETE_ROLE).await
}
