//! Fixed-window rate limiting over real HTTP.

use reqwest::{header, StatusCode};
use social_service::config::RateLimitConfig;
use social_test_utils::TestSocialServer;
use std::time::Duration;

async fn spawn_limited(limit: u32, time_frame: Duration) -> Result<TestSocialServer, anyhow::Error> {
    TestSocialServer::builder()
        .with_rate_limit(RateLimitConfig {
            requests_per_time_frame: limit,
            time_frame,
            enabled: true,
        })
        .spawn()
        .await
}

async fn get_as(server: &TestSocialServer, ip: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .get(server.url())
        .header("X-Forwarded-For", ip)
        .send()
        .await?)
}

#[tokio::test]
async fn test_rate_limit_rejects_after_limit_with_retry_after() -> Result<(), anyhow::Error> {
    let server = spawn_limited(20, Duration::from_secs(5)).await?;

    for i in 0..20 {
        let response = get_as(&server, "192.168.1.1").await?;
        assert_eq!(response.status(), StatusCode::OK, "request {} should pass", i + 1);
    }

    for _ in 0..2 {
        let response = get_as(&server, "192.168.1.1").await?;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok());
        assert_eq!(retry_after, Some("5"));
    }

    Ok(())
}

#[tokio::test]
async fn test_rate_limit_is_per_client() -> Result<(), anyhow::Error> {
    let server = spawn_limited(2, Duration::from_secs(5)).await?;

    assert_eq!(get_as(&server, "10.0.0.1").await?.status(), StatusCode::OK);
    assert_eq!(get_as(&server, "10.0.0.1").await?.status(), StatusCode::OK);
    assert_eq!(
        get_as(&server, "10.0.0.1").await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    assert_eq!(get_as(&server, "10.0.0.2").await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_window_reopens_after_time_frame() -> Result<(), anyhow::Error> {
    let server = spawn_limited(1, Duration::from_millis(300)).await?;

    assert_eq!(get_as(&server, "10.1.1.1").await?.status(), StatusCode::OK);
    assert_eq!(
        get_as(&server, "10.1.1.1").await?.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(get_as(&server, "10.1.1.1").await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_applies_to_rejected_auth_requests() -> Result<(), anyhow::Error> {
    let server = spawn_limited(1, Duration::from_secs(5)).await?;
    let url = format!("{}/v1/posts", server.url());

    let first = server
        .client()
        .get(&url)
        .header("X-Forwarded-For", "10.2.2.2")
        .send()
        .await?;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);

    let second = server
        .client()
        .get(&url)
        .header("X-Forwarded-For", "10.2.2.2")
        .send()
        .await?;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_disabled_admits_everything() -> Result<(), anyhow::Error> {
    let server = TestSocialServer::spawn().await?;

    for _ in 0..50 {
        assert_eq!(get_as(&server, "192.168.1.1").await?.status(), StatusCode::OK);
    }
    Ok(())
}
