//! Registration, activation and the compensation path when mail fails.

use reqwest::StatusCode;
use social_service::mailer::CONFIRMATION_SUBJECT;
use social_test_utils::{TestSocialServer, TEST_FRONTEND_URL, TEST_PASSWORD};

#[tokio::test]
async fn test_register_returns_created_user_with_activation_token() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server.register("bob", "bob@x.com", TEST_PASSWORD).await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["username"], "bob");
    assert_eq!(body["email"], "bob@x.com");
    assert_eq!(body["active"], false);
    assert!(body.get("password_hash").is_none());
    let token = body["activation_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing activation_token"))?;
    assert!(!token.is_empty());

    let mail = server
        .mailer()
        .last_sent()
        .ok_or_else(|| anyhow::anyhow!("no mail sent"))?;
    assert_eq!(mail.to, "bob@x.com");
    assert_eq!(mail.subject, CONFIRMATION_SUBJECT);
    assert_eq!(
        mail.data.activation_url,
        format!("{TEST_FRONTEND_URL}/confirm/{token}")
    );
    Ok(())
}

#[tokio::test]
async fn test_register_with_failing_mailer_leaves_no_user() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::builder()
        .with_failing_mailer()
        .spawn()
        .await?;

    let response = server.register("bob", "bob@x.com", "longenough1").await?;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(server.mailer().attempts(), 1);
    assert_eq!(server.store().user_count().await, 0);
    let login = server.login("bob@x.com", "longenough1").await?;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);

    // The email is free again once delivery works.
    server.mailer().set_failing(false);
    let response = server.register("bob", "bob@x.com", "longenough1").await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let first = server.register("bob", "bob@x.com", TEST_PASSWORD).await?;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = server.register("bobby", "bob@x.com", TEST_PASSWORD).await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_register_rejects_invalid_payloads() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    for (username, email, password) in [
        ("b", "bob@x.com", TEST_PASSWORD),
        ("bob", "not-an-email", TEST_PASSWORD),
        ("bob", "bob@x.com", "short"),
    ] {
        let response = server.register(username, email, password).await?;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "{username}/{email}/{password}"
        );
    }
    assert_eq!(server.mailer().attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_activation_succeeds_once() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let response = server.register("carol", "carol@x.com", TEST_PASSWORD).await?;
    let body: serde_json::Value = response.json().await?;
    let token = body["activation_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing activation_token"))?
        .to_string();

    let first = server.activate(&token).await?;
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    let message: String = first.json().await?;
    assert_eq!(message, "User activated successfully");

    let second = server.activate(&token).await?;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_activation_via_get_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let response = server.register("dave", "dave@x.com", TEST_PASSWORD).await?;
    let body: serde_json::Value = response.json().await?;
    let token = body["activation_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing activation_token"))?
        .to_string();

    let response = server
        .client()
        .get(format!("{}/v1/users/activate/{}", server.url(), token))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    Ok(())
}

#[tokio::test]
async fn test_activation_with_unknown_token_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server.activate("no-such-token").await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_activation_with_expired_invitation_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let response = server.register("erin", "erin@x.com", TEST_PASSWORD).await?;
    let body: serde_json::Value = response.json().await?;
    let user_id = body["id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("missing id"))?;
    let token = body["activation_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("missing activation_token"))?
        .to_string();

    server
        .store()
        .set_invitation_expiry(user_id, chrono::Utc::now() - chrono::Duration::minutes(1))
        .await;

    let response = server.activate(&token).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
