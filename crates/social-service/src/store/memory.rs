//! In-process [`Store`] with the same observable contract as `PgStore`.
//!
//! All state sits behind one `tokio::sync::Mutex`, so multi-step operations
//! such as `create_and_invite` and `activate_user` are atomic. Individual
//! operations can be forced to fail with [`InMemoryStore::fail_operation`].

use super::{Store, StoreError};
use crate::models::{
    Comment, FeedQuery, Invitation, NewComment, NewPost, NewUser, Post, PostChanges,
    PostWithMetadata, Role, SortOrder, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    roles: Vec<Role>,
    invitations: Vec<Invitation>,
    posts: BTreeMap<i64, Post>,
    comments: Vec<Comment>,
    follows: HashSet<(i64, i64)>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    failing: HashSet<String>,
}

impl State {
    fn check(&self, operation: &str) -> Result<(), StoreError> {
        if self.failing.contains(operation) {
            return Err(StoreError::Database(format!("injected failure: {operation}")));
        }
        Ok(())
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        let email = user.email.to_lowercase();
        if self.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict(
                "A user with that email already exists".to_string(),
            ));
        }
        if self.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(
                "A user with that username already exists".to_string(),
            ));
        }

        self.next_user_id += 1;
        let created = User {
            id: self.next_user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
            active: false,
            role_id: user.role_id,
            activation_token: None,
        };
        self.users.insert(created.id, created.clone());
        Ok(created)
    }

    fn username_of(&self, user_id: i64) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }

    fn listing(&self, feed_owner: Option<i64>, query: &FeedQuery) -> Vec<PostWithMetadata> {
        let mut matching: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| match feed_owner {
                Some(owner) => p.user_id == owner || self.follows.contains(&(owner, p.user_id)),
                None => true,
            })
            .filter(|p| query.matches(&p.title, &p.content, &p.tags))
            .collect();

        matching.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        if query.sort == SortOrder::Desc {
            matching.reverse();
        }

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);

        matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| PostWithMetadata {
                id: p.id,
                user_id: p.user_id,
                title: p.title.clone(),
                content: p.content.clone(),
                tags: p.tags.clone(),
                version: p.version,
                created_at: p.created_at,
                username: self.username_of(p.user_id),
                comments_count: self.comments.iter().filter(|c| c.post_id == p.id).count() as i64,
            })
            .collect()
    }
}

/// Store kept in memory, seeded with the `user`, `moderator` and `admin` roles.
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let roles = vec![
            role(1, "user", 1, "A user can create posts and comments"),
            role(2, "moderator", 2, "A moderator can update other users posts"),
            role(3, "admin", 3, "An admin can update and delete other users posts"),
        ];
        Self {
            state: Mutex::new(State {
                roles,
                ..State::default()
            }),
        }
    }

    /// Make every subsequent call to `operation` (a `Store` method name) fail.
    pub async fn fail_operation(&self, operation: &str) {
        self.state.lock().await.failing.insert(operation.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    /// Number of invitations held for `user_id`.
    pub async fn invitation_count(&self, user_id: i64) -> usize {
        self.state
            .lock()
            .await
            .invitations
            .iter()
            .filter(|i| i.user_id == user_id)
            .count()
    }

    /// Move every invitation of `user_id` to `expiry`.
    pub async fn set_invitation_expiry(&self, user_id: i64, expiry: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        for invitation in state.invitations.iter_mut().filter(|i| i.user_id == user_id) {
            invitation.expiry = expiry;
        }
    }

    /// Change a user's role directly, bypassing any cache.
    pub async fn set_user_role(&self, user_id: i64, role_id: i64) {
        if let Some(user) = self.state.lock().await.users.get_mut(&user_id) {
            user.role_id = role_id;
        }
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }
}

fn role(id: i64, name: &str, level: i32, description: &str) -> Role {
    Role {
        id,
        name: name.to_string(),
        level,
        description: description.to_string(),
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_user")?;
        state.insert_user(user)
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<User, StoreError> {
        let state = self.state.lock().await;
        state.check("get_user_by_id")?;
        state.users.get(&user_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let state = self.state.lock().await;
        state.check("get_user_by_email")?;
        let email = email.to_lowercase();
        state
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_user_by_id(&self, user_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("delete_user_by_id")?;
        if state.users.get(&user_id).is_some_and(|u| !u.active) {
            state.users.remove(&user_id);
            state.invitations.retain(|i| i.user_id != user_id);
        }
        Ok(())
    }

    async fn activate_user(&self, token_hash: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("activate_user")?;

        let now = Utc::now();
        let user_id = state
            .invitations
            .iter()
            .find(|i| i.token == token_hash && i.expiry > now)
            .map(|i| i.user_id)
            .ok_or(StoreError::NotFound)?;

        let user = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.active = true;
        state.invitations.retain(|i| i.user_id != user_id);
        Ok(())
    }

    async fn create_and_invite(
        &self,
        user: &NewUser,
        token_hash: &str,
        expiry: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_and_invite")?;

        let created = state.insert_user(user)?;
        state.invitations.push(Invitation {
            token: token_hash.to_string(),
            user_id: created.id,
            expiry,
        });
        Ok(created)
    }

    async fn clean_invitation_by_user_id(&self, user_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("clean_invitation_by_user_id")?;
        state.invitations.retain(|i| i.user_id != user_id);
        Ok(())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, StoreError> {
        let state = self.state.lock().await;
        state.check("get_role_by_name")?;
        state
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn is_role_precedent(
        &self,
        role_id: i64,
        required_role: &str,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        state.check("is_role_precedent")?;
        let required = state.roles.iter().find(|r| r.name == required_role);
        let actual = state.roles.iter().find(|r| r.id == role_id);
        Ok(matches!((actual, required), (Some(a), Some(r)) if a.level >= r.level))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_post")?;
        state.next_post_id += 1;
        let now = Utc::now();
        let created = Post {
            id: state.next_post_id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
            tags: post.tags.clone(),
            version: 0,
            created_at: now,
            updated_at: now,
            comments: Vec::new(),
        };
        state.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_post_by_id(&self, post_id: i64) -> Result<Post, StoreError> {
        let state = self.state.lock().await;
        state.check("get_post_by_id")?;
        state.posts.get(&post_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_post(
        &self,
        post_id: i64,
        expected_version: i32,
        changes: &PostChanges,
    ) -> Result<Post, StoreError> {
        let mut state = self.state.lock().await;
        state.check("update_post")?;
        let post = state
            .posts
            .get_mut(&post_id)
            .filter(|p| p.version == expected_version)
            .ok_or(StoreError::NotFound)?;
        post.title = changes.title.clone();
        post.content = changes.content.clone();
        post.tags = changes.tags.clone();
        post.version += 1;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_post_by_id(&self, post_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("delete_post_by_id")?;
        state.posts.remove(&post_id).ok_or(StoreError::NotFound)?;
        state.comments.retain(|c| c.post_id != post_id);
        Ok(())
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostWithMetadata>, StoreError> {
        let state = self.state.lock().await;
        state.check("list_posts")?;
        Ok(state.listing(None, query))
    }

    async fn get_user_feed(
        &self,
        user_id: i64,
        query: &FeedQuery,
    ) -> Result<Vec<PostWithMetadata>, StoreError> {
        let state = self.state.lock().await;
        state.check("get_user_feed")?;
        Ok(state.listing(Some(user_id), query))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let mut state = self.state.lock().await;
        state.check("create_comment")?;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(StoreError::NotFound);
        }
        state.next_comment_id += 1;
        let created = Comment {
            id: state.next_comment_id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content.clone(),
            created_at: Utc::now(),
            username: state.username_of(comment.user_id),
        };
        state.comments.push(created.clone());
        Ok(created)
    }

    async fn get_comments_by_post_id(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.lock().await;
        state.check("get_comments_by_post_id")?;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(comments)
    }

    async fn follow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("follow")?;
        if !state.users.contains_key(&follow_id) {
            return Err(StoreError::NotFound);
        }
        if !state.follows.insert((user_id, follow_id)) {
            return Err(StoreError::Conflict(
                "Already following this user".to_string(),
            ));
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: i64, follow_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.check("unfollow")?;
        state.follows.remove(&(user_id, follow_id));
        Ok(())
    }
}
