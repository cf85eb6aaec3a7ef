//! Posts, comments and the ownership/role gates.

use reqwest::StatusCode;
use serde_json::json;
use social_test_utils::{TestSocialServer, TestUser};

const MODERATOR_ROLE_ID: i64 = 2;
const ADMIN_ROLE_ID: i64 = 3;

async fn user_with_role(
    server: &TestSocialServer,
    name: &str,
    role_id: i64,
) -> Result<TestUser, anyhow::Error> {
    let user = server.create_active_user(name).await?;
    server.store().set_user_role(user.id, role_id).await;
    Ok(user)
}

async fn patch_title(
    server: &TestSocialServer,
    user: &TestUser,
    post_id: i64,
    title: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .patch(format!("{}/v1/posts/{}", server.url(), post_id))
        .bearer_auth(&user.token)
        .json(&json!({ "title": title }))
        .send()
        .await?)
}

async fn delete_post(
    server: &TestSocialServer,
    user: &TestUser,
    post_id: i64,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .delete(format!("{}/v1/posts/{}", server.url(), post_id))
        .bearer_auth(&user.token)
        .send()
        .await?)
}

#[tokio::test]
async fn test_create_and_get_post() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let post_id = server.create_post(&alice, "first post").await?;

    let response = server
        .client()
        .get(format!("{}/v1/posts/{}", server.url(), post_id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["title"], "first post");
    assert_eq!(body["user_id"], alice.id);
    assert_eq!(body["comments"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_create_post_rejects_short_title() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server
        .client()
        .post(format!("{}/v1/posts", server.url()))
        .bearer_auth(&alice.token)
        .json(&json!({ "title": "x", "content": "some content" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_unknown_post_is_not_found_for_every_method() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let get = server
        .client()
        .get(format!("{}/v1/posts/999", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(get.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        patch_title(&server, &alice, 999, "new title").await?.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        delete_post(&server, &alice, 999).await?.status(),
        StatusCode::NOT_FOUND
    );
    Ok(())
}

#[tokio::test]
async fn test_owner_can_update_and_version_increments() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let post_id = server.create_post(&alice, "first post").await?;

    let response = patch_title(&server, &alice, post_id, "edited post").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["title"], "edited post");
    assert_eq!(body["content"], "post content");
    assert_eq!(body["version"], 1);
    Ok(())
}

#[tokio::test]
async fn test_other_user_cannot_update_or_delete() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let mallory = server.create_active_user("mallory").await?;
    let post_id = server.create_post(&alice, "first post").await?;

    assert_eq!(
        patch_title(&server, &mallory, post_id, "hijacked").await?.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        delete_post(&server, &mallory, post_id).await?.status(),
        StatusCode::FORBIDDEN
    );
    Ok(())
}

#[tokio::test]
async fn test_moderator_can_update_but_not_delete() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let moderator = user_with_role(&server, "moderator", MODERATOR_ROLE_ID).await?;
    let post_id = server.create_post(&alice, "first post").await?;

    assert_eq!(
        patch_title(&server, &moderator, post_id, "moderated").await?.status(),
        StatusCode::OK
    );
    assert_eq!(
        delete_post(&server, &moderator, post_id).await?.status(),
        StatusCode::FORBIDDEN
    );
    Ok(())
}

#[tokio::test]
async fn test_admin_can_delete() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let admin = user_with_role(&server, "admin", ADMIN_ROLE_ID).await?;
    let post_id = server.create_post(&alice, "first post").await?;

    assert_eq!(
        delete_post(&server, &admin, post_id).await?.status(),
        StatusCode::NO_CONTENT
    );

    let response = server
        .client()
        .get(format!("{}/v1/posts/{}", server.url(), post_id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_role_lookup_failure_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let admin = user_with_role(&server, "admin", ADMIN_ROLE_ID).await?;
    let post_id = server.create_post(&alice, "first post").await?;
    server.store().fail_operation("is_role_precedent").await;

    assert_eq!(
        delete_post(&server, &admin, post_id).await?.status(),
        StatusCode::UNAUTHORIZED
    );
    Ok(())
}

#[tokio::test]
async fn test_comments_are_attached_to_post() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let bob = server.create_active_user("bob").await?;
    let post_id = server.create_post(&alice, "first post").await?;

    let response = server
        .client()
        .post(format!("{}/v1/posts/{}/comments", server.url(), post_id))
        .bearer_auth(&bob.token)
        .json(&json!({ "content": "nice post" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment: serde_json::Value = response.json().await?;
    assert_eq!(comment["user_id"], bob.id);
    assert_eq!(comment["post_id"], post_id);

    let response = server
        .client()
        .get(format!("{}/v1/posts/{}", server.url(), post_id))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    let body: serde_json::Value = response.json().await?;
    let comments = body["comments"]
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("comments missing"))?;
    assert_eq!(comments.len(), 1);
    assert_eq!(body["comments"][0]["content"], "nice post");
    assert_eq!(body["comments"][0]["username"], "bob");
    Ok(())
}

#[tokio::test]
async fn test_comment_on_unknown_post_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server
        .client()
        .post(format!("{}/v1/posts/999/comments", server.url()))
        .bearer_auth(&alice.token)
        .json(&json!({ "content": "hello" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
