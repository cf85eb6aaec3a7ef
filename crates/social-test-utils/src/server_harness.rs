//! Test server harness for end-to-end tests.
//!
//! Provides [`TestSocialServer`], which runs the real router on a random
//! local port against an in-memory store, an in-memory user cache and a
//! recording mail sender.

use crate::fixtures::{email_for, test_config, TEST_BASIC_AUTH_PASS, TEST_BASIC_AUTH_USER, TEST_PASSWORD};
use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use social_service::cache::MemoryUserCache;
use social_service::config::{Config, RateLimitConfig};
use social_service::mailer::MockEmailSender;
use social_service::observability::metrics::init_metrics_recorder;
use social_service::routes::{self, AppState};
use social_service::store::memory::InMemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A registered, activated user and a bearer token for it.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Options for [`TestSocialServer`].
#[derive(Default)]
pub struct TestSocialServerBuilder {
    rate_limit: Option<RateLimitConfig>,
    failing_mailer: bool,
}

impl TestSocialServerBuilder {
    /// Enable the rate limiter with `config`.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Make every activation email fail to send.
    pub fn with_failing_mailer(mut self) -> Self {
        self.failing_mailer = true;
        self
    }

    pub async fn spawn(self) -> Result<TestSocialServer, anyhow::Error> {
        let mut config = test_config();
        if let Some(rate_limit) = self.rate_limit {
            config.rate_limit = rate_limit;
        }

        let mailer = Arc::new(if self.failing_mailer {
            MockEmailSender::failing()
        } else {
            MockEmailSender::accepting()
        });

        TestSocialServer::start(config, mailer).await
    }
}

/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register_flow() -> Result<()> {
///     let server = TestSocialServer::spawn().await?;
///     let response = server.register("bob", "bob@x.com", "longenough1").await?;
///     assert_eq!(response.status(), 201);
///     Ok(())
/// }
/// ```
pub struct TestSocialServer {
    addr: SocketAddr,
    config: Config,
    store: Arc<InMemoryStore>,
    cache: Arc<MemoryUserCache>,
    mailer: Arc<MockEmailSender>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestSocialServer {
    /// Spawn with the rate limiter disabled and an accepting mailer.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::builder().spawn().await
    }

    pub fn builder() -> TestSocialServerBuilder {
        TestSocialServerBuilder::default()
    }

    async fn start(config: Config, mailer: Arc<MockEmailSender>) -> Result<Self, anyhow::Error> {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(MemoryUserCache::new(config.cache_ttl));

        let state = Arc::new(AppState::new(
            config.clone(),
            store.clone(),
            cache.clone(),
            mailer.clone(),
        ));

        // A recorder may already be installed by an earlier test in this
        // process; fall back to a private one.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow!("Failed to bind test server: {}", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            store,
            cache,
            mailer,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn cache(&self) -> &MemoryUserCache {
        &self.cache
    }

    pub fn mailer(&self) -> &MockEmailSender {
        &self.mailer
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `Authorization` value for the operator endpoints.
    pub fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{TEST_BASIC_AUTH_USER}:{TEST_BASIC_AUTH_PASS}"))
        )
    }

    /// POST /v1/authentication/user
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/v1/authentication/user", self.url()))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?)
    }

    /// POST /v1/authentication/token
    pub async fn login(&self, email: &str, password: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/v1/authentication/token", self.url()))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// PUT /v1/users/activate/:token
    pub async fn activate(&self, token: &str) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .put(format!("{}/v1/users/activate/{}", self.url(), token))
            .send()
            .await?)
    }

    /// Register, activate and log in `username` with [`TEST_PASSWORD`].
    pub async fn create_active_user(&self, username: &str) -> Result<TestUser, anyhow::Error> {
        let email = email_for(username);

        let response = self.register(username, &email, TEST_PASSWORD).await?;
        if response.status() != reqwest::StatusCode::CREATED {
            bail!("registration of {username} failed: {}", response.status());
        }
        let body: Value = response.json().await?;
        let id = body
            .get("id")
            .and_then(Value::as_i64)
            .context("registration response has no id")?;
        let activation_token = body
            .get("activation_token")
            .and_then(Value::as_str)
            .context("registration response has no activation_token")?
            .to_string();

        let response = self.activate(&activation_token).await?;
        if response.status() != reqwest::StatusCode::ACCEPTED {
            bail!("activation of {username} failed: {}", response.status());
        }

        let response = self.login(&email, TEST_PASSWORD).await?;
        if response.status() != reqwest::StatusCode::OK {
            bail!("login of {username} failed: {}", response.status());
        }
        let body: Value = response.json().await?;
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .context("token response has no token")?
            .to_string();

        Ok(TestUser {
            id,
            username: username.to_string(),
            email,
            token,
        })
    }

    /// POST /v1/posts as `user`, returning the created post's id.
    pub async fn create_post(&self, user: &TestUser, title: &str) -> Result<i64, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/v1/posts", self.url()))
            .bearer_auth(&user.token)
            .json(&json!({ "title": title, "content": "post content", "tags": ["test"] }))
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::CREATED {
            bail!("post creation failed: {}", response.status());
        }
        let body: Value = response.json().await?;
        body.get("id")
            .and_then(Value::as_i64)
            .context("post response has no id")
    }
}
