//! Public and operator endpoints.

use reqwest::{header, StatusCode};
use social_test_utils::TestSocialServer;

#[tokio::test]
async fn test_welcome_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server.client().get(server.url()).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "welcome");
    Ok(())
}

#[tokio::test]
async fn test_health_without_credentials_is_challenged() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/v1/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok());
    assert_eq!(challenge, Some("Basic realm=\"Restricted\""));
    Ok(())
}

#[tokio::test]
async fn test_health_with_wrong_password_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/v1/health", server.url()))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_health_with_operator_credentials_reports_status() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/v1/health", server.url()))
        .header(header::AUTHORIZATION, server.basic_auth_header())
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"], "test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn test_health_rejects_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;
    let alice = server.create_active_user("alice").await?;

    let response = server
        .client()
        .get(format!("{}/v1/health", server.url()))
        .bearer_auth(&alice.token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
