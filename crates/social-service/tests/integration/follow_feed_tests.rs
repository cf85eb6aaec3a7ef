//! Follows and the personal feed.

use reqwest::StatusCode;
use social_test_utils::{TestSocialServer, TestUser};

async fn put_follow(
    server: &TestSocialServer,
    user: &TestUser,
    target: i64,
    action: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .put(format!("{}/v1/users/{}/{}", server.url(), target, action))
        .bearer_auth(&user.token)
        .send()
        .await?)
}

async fn feed(
    server: &TestSocialServer,
    user: &TestUser,
    query: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .get(format!("{}/v1/users/feed{}", server.url(), query))
        .bearer_auth(&user.token)
        .send()
        .await?)
}

fn titles(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .map(|posts| {
            posts
                .iter()
                .filter_map(|p| p.get("title").and_then(|t| t.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_follow_and_unfollow() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let bob = server.create_active_user("bob").await?;

    assert_eq!(
        put_follow(&server, &alice, bob.id, "follow").await?.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        put_follow(&server, &alice, bob.id, "follow").await?.status(),
        StatusCode::CONFLICT
    );
    assert_eq!(
        put_follow(&server, &alice, bob.id, "unfollow").await?.status(),
        StatusCode::NO_CONTENT
    );
    Ok(())
}

#[tokio::test]
async fn test_follow_self_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    assert_eq!(
        put_follow(&server, &alice, alice.id, "follow").await?.status(),
        StatusCode::BAD_REQUEST
    );
    Ok(())
}

#[tokio::test]
async fn test_follow_unknown_user_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    assert_eq!(
        put_follow(&server, &alice, alice.id + 1000, "follow").await?.status(),
        StatusCode::NOT_FOUND
    );
    Ok(())
}

#[tokio::test]
async fn test_feed_contains_own_and_followed_posts_only() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let bob = server.create_active_user("bob").await?;
    let carol = server.create_active_user("carol").await?;

    server.create_post(&alice, "alice post").await?;
    server.create_post(&bob, "bob post").await?;
    server.create_post(&carol, "carol post").await?;
    put_follow(&server, &alice, bob.id, "follow").await?;

    let response = feed(&server, &alice, "").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    let mut got = titles(&body);
    got.sort();
    assert_eq!(got, vec!["alice post".to_string(), "bob post".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_feed_pagination_and_search() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    for title in ["rust one", "rust two", "go three"] {
        server.create_post(&alice, title).await?;
    }

    let body: serde_json::Value = feed(&server, &alice, "?limit=2").await?.json().await?;
    assert_eq!(titles(&body).len(), 2);

    let body: serde_json::Value = feed(&server, &alice, "?search=RUST").await?.json().await?;
    let mut got = titles(&body);
    got.sort();
    assert_eq!(got, vec!["rust one".to_string(), "rust two".to_string()]);

    let body: serde_json::Value = feed(&server, &alice, "?sort=asc&limit=1").await?.json().await?;
    assert_eq!(titles(&body), vec!["rust one".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_feed_rejects_invalid_query() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    for query in ["?limit=0", "?limit=101", "?offset=-1", "?sort=sideways", "?limit=abc"] {
        assert_eq!(
            feed(&server, &alice, query).await?.status(),
            StatusCode::BAD_REQUEST,
            "{query}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_list_posts_includes_everyone() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let bob = server.create_active_user("bob").await?;
    server.create_post(&alice, "alice post").await?;
    server.create_post(&bob, "bob post").await?;

    let response = server
        .client()
        .get(format!("{}/v1/posts", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(titles(&body).len(), 2);
    assert_eq!(body[0]["comments_count"], 0);
    Ok(())
}
