//! Login and bearer authentication.

use reqwest::{header, StatusCode};
use social_test_utils::{TestSocialServer, TestTokenBuilder, TEST_PASSWORD};

#[tokio::test]
async fn test_login_returns_token_accepted_by_protected_routes() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server
        .client()
        .get(format!("{}/v1/users/{}", server.url(), alice.id))
        .bearer_auth(&alice.token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["id"], alice.id);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server.login(&alice.email, "wrong-password").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_login_with_unknown_email_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server.login("nobody@example.com", TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_login_with_malformed_email_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server.login("not-an-email", TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_missing_authorization_is_unauthorized_with_challenge() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/v1/posts", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_some());
    Ok(())
}

#[tokio::test]
async fn test_malformed_authorization_headers_are_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    for value in [
        alice.token.clone(),
        format!("bearer {}", alice.token),
        format!("Bearer {} extra", alice.token),
        "Bearer".to_string(),
    ] {
        let response = server
            .client()
            .get(format!("{}/v1/posts", server.url()))
            .header(header::AUTHORIZATION, &value)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
    }
    Ok(())
}

#[tokio::test]
async fn test_rejected_tokens_are_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let tokens = [
        TestTokenBuilder::new().for_user(alice.id).expires_in(-3600).build(),
        TestTokenBuilder::new()
            .for_user(alice.id)
            .signed_with(b"some-other-secret")
            .build(),
        TestTokenBuilder::new()
            .for_user(alice.id)
            .with_audience("someone-else")
            .build(),
        TestTokenBuilder::new()
            .for_user(alice.id)
            .with_issuer("someone-else")
            .build(),
        TestTokenBuilder::new()
            .for_user(alice.id)
            .not_before_in(3600)
            .build(),
        TestTokenBuilder::new().with_subject("alice").build(),
        TestTokenBuilder::new().for_user(alice.id + 1000).build(),
    ];

    for token in tokens {
        let response = server
            .client()
            .get(format!("{}/v1/posts", server.url()))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn test_builder_token_for_existing_user_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    let token = TestTokenBuilder::new().for_user(alice.id).build();

    let response = server
        .client()
        .get(format!("{}/v1/posts", server.url()))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_authenticated_user_is_cached_after_first_request() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;
    assert!(server.cache().is_empty().await);

    let response = server
        .client()
        .get(format!("{}/v1/posts", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.cache().len().await, 1);

    // Cache failures fall through to the store.
    server.cache().set_failing(true);
    let response = server
        .client()
        .get(format!("{}/v1/posts", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server
        .client()
        .get(format!("{}/v1/users/{}", server.url(), alice.id + 1000))
        .bearer_auth(&alice.token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
