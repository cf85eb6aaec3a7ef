//! Fixed configuration and credentials for tests.

use social_service::config::Config;
use std::collections::HashMap;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-social-api";
pub const TEST_BASIC_AUTH_USER: &str = "admin";
pub const TEST_BASIC_AUTH_PASS: &str = "test-operator-pass";
pub const TEST_FRONTEND_URL: &str = "http://frontend.test";

/// Password accepted by registration validation (8 to 100 chars).
pub const TEST_PASSWORD: &str = "longenough1";

/// Environment as the service would read it, with the rate limiter off and
/// the cheapest bcrypt cost.
pub fn test_vars() -> HashMap<String, String> {
    HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://unused@localhost/social_test".to_string(),
        ),
        ("JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
        ("BASIC_AUTH_USER".to_string(), TEST_BASIC_AUTH_USER.to_string()),
        ("BASIC_AUTH_PASS".to_string(), TEST_BASIC_AUTH_PASS.to_string()),
        ("FRONTEND_URL".to_string(), TEST_FRONTEND_URL.to_string()),
        ("ENV".to_string(), "test".to_string()),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("RATELIMITER_ENABLED".to_string(), "false".to_string()),
        ("BCRYPT_COST".to_string(), "4".to_string()),
        ("DRAIN_SECONDS".to_string(), "0".to_string()),
    ])
}

pub fn test_config() -> Config {
    Config::from_vars(&test_vars()).expect("test configuration should be valid")
}

/// Email derived from a username, for tests that create many users.
pub fn email_for(username: &str) -> String {
    format!("{username}@example.com")
}
