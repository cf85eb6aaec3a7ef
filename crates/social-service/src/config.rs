//! Social API configuration.
//!
//! Configuration is loaded from environment variables. The database URL and
//! all secrets are redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_EXTERNAL_URL: &str = "localhost:8080";
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
pub const DEFAULT_ENV: &str = "development";

pub const DEFAULT_DB_MAX_OPEN_CONNS: u32 = 30;
pub const DEFAULT_DB_MAX_IDLE_TIME_SECONDS: u64 = 900;
pub const DEFAULT_DB_QUERY_TIMEOUT_SECONDS: u64 = 5;

pub const DEFAULT_REDIS_ADDR: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 24 * 60 * 60;

pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 20;
pub const DEFAULT_RATE_LIMIT_TIME_FRAME_SECONDS: u64 = 5;

/// Default token lifetime: three days.
pub const DEFAULT_JWT_EXPIRY_SECONDS: i64 = 3 * 24 * 60 * 60;
pub const DEFAULT_JWT_ISSUER: &str = "social";
pub const DEFAULT_JWT_AUDIENCE: &str = "social";

pub const DEFAULT_BASIC_AUTH_USER: &str = "admin";

/// bcrypt cost bounds accepted by `BCRYPT_COST`.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 14;

pub const DEFAULT_SMTP_HOST: &str = "sandbox.smtp.mailtrap.io";
pub const DEFAULT_SMTP_PORT: u16 = 2525;
pub const DEFAULT_MAIL_FROM_EMAIL: &str = "no-reply@social.local";
pub const DEFAULT_MAIL_FROM_NAME: &str = "Social";
pub const DEFAULT_INVITATION_EXPIRY_SECONDS: i64 = 30 * 60;

/// Default graceful-shutdown drain outside development.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fixed-window limiter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_time_frame: u32,
    pub time_frame: Duration,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_time_frame: DEFAULT_RATE_LIMIT_REQUESTS,
            time_frame: Duration::from_secs(DEFAULT_RATE_LIMIT_TIME_FRAME_SECONDS),
            enabled: true,
        }
    }
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: SecretString,
    pub expiry_seconds: i64,
    pub issuer: String,
    pub audience: String,
}

#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub from_email: String,
    pub from_name: String,
    pub invitation_expiry_seconds: i64,
}

/// Social API configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    pub bind_address: String,

    /// Public host:port of this API, reported in logs.
    pub external_url: String,

    /// Base URL of the web client; activation links point here.
    pub frontend_url: String,

    /// Deployment environment name (`development`, `production`, ...).
    pub env: String,

    pub db_max_open_conns: u32,
    pub db_max_idle_time: Duration,
    pub db_query_timeout: Duration,

    pub redis_addr: String,
    pub redis_enabled: bool,
    pub cache_ttl: Duration,

    pub rate_limit: RateLimitConfig,

    pub jwt: JwtConfig,

    pub basic_auth_user: String,
    pub basic_auth_pass: SecretString,

    /// bcrypt work factor for password hashes.
    pub bcrypt_cost: u32,

    pub mail: MailConfig,

    /// How long to keep serving in-flight requests after a shutdown signal.
    pub drain: Duration,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("external_url", &self.external_url)
            .field("frontend_url", &self.frontend_url)
            .field("env", &self.env)
            .field("db_max_open_conns", &self.db_max_open_conns)
            .field("db_max_idle_time", &self.db_max_idle_time)
            .field("db_query_timeout", &self.db_query_timeout)
            .field("redis_addr", &"[REDACTED]")
            .field("redis_enabled", &self.redis_enabled)
            .field("cache_ttl", &self.cache_ttl)
            .field("rate_limit", &self.rate_limit)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_seconds", &self.jwt.expiry_seconds)
            .field("jwt_issuer", &self.jwt.issuer)
            .field("jwt_audience", &self.jwt.audience)
            .field("basic_auth_user", &self.basic_auth_user)
            .field("basic_auth_pass", &"[REDACTED]")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("smtp_host", &self.mail.smtp_host)
            .field("smtp_port", &self.mail.smtp_port)
            .field("smtp_password", &"[REDACTED]")
            .field("mail_from_email", &self.mail.from_email)
            .field("drain", &self.drain)
            .finish()
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn string_or(vars: &HashMap<String, String>, name: &str, default: &str) -> String {
    vars.get(name)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match vars.get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::invalid(name, format!("'{raw}': {e}"))),
        None => Ok(default),
    }
}

fn positive<T>(name: &str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::invalid(
            name,
            format!("must be greater than 0, got {value}"),
        ));
    }
    Ok(value)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let env_name = string_or(vars, "ENV", DEFAULT_ENV);

        let rate_limit = RateLimitConfig {
            requests_per_time_frame: positive(
                "RATELIMITER_REQUESTS_COUNT",
                parse_or(vars, "RATELIMITER_REQUESTS_COUNT", DEFAULT_RATE_LIMIT_REQUESTS)?,
            )?,
            time_frame: Duration::from_secs(positive(
                "RATELIMITER_TIME_FRAME_SECONDS",
                parse_or(
                    vars,
                    "RATELIMITER_TIME_FRAME_SECONDS",
                    DEFAULT_RATE_LIMIT_TIME_FRAME_SECONDS,
                )?,
            )?),
            enabled: parse_or(vars, "RATELIMITER_ENABLED", true)?,
        };

        let jwt = JwtConfig {
            secret: SecretString::from(required(vars, "JWT_SECRET")?),
            expiry_seconds: positive(
                "JWT_EXPIRY_SECONDS",
                parse_or(vars, "JWT_EXPIRY_SECONDS", DEFAULT_JWT_EXPIRY_SECONDS)?,
            )?,
            issuer: string_or(vars, "JWT_ISSUER", DEFAULT_JWT_ISSUER),
            audience: string_or(vars, "JWT_AUDIENCE", DEFAULT_JWT_AUDIENCE),
        };

        let mail = MailConfig {
            smtp_host: string_or(vars, "SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port: parse_or(vars, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
            smtp_username: vars.get("SMTP_USERNAME").filter(|v| !v.is_empty()).cloned(),
            smtp_password: vars
                .get("SMTP_PASSWORD")
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::from(v.clone())),
            from_email: string_or(vars, "MAIL_FROM_EMAIL", DEFAULT_MAIL_FROM_EMAIL),
            from_name: string_or(vars, "MAIL_FROM_NAME", DEFAULT_MAIL_FROM_NAME),
            invitation_expiry_seconds: positive(
                "MAIL_INVITATION_EXPIRY_SECONDS",
                parse_or(
                    vars,
                    "MAIL_INVITATION_EXPIRY_SECONDS",
                    DEFAULT_INVITATION_EXPIRY_SECONDS,
                )?,
            )?,
        };

        let bcrypt_cost = parse_or(vars, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::invalid(
                "BCRYPT_COST",
                format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {bcrypt_cost}"),
            ));
        }

        let default_drain = if env_name == DEFAULT_ENV {
            0
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            database_url,
            bind_address: string_or(vars, "BIND_ADDRESS", DEFAULT_BIND_ADDRESS),
            external_url: string_or(vars, "EXTERNAL_URL", DEFAULT_EXTERNAL_URL),
            frontend_url: string_or(vars, "FRONTEND_URL", DEFAULT_FRONTEND_URL)
                .trim_end_matches('/')
                .to_string(),
            db_max_open_conns: positive(
                "DB_MAX_OPEN_CONNS",
                parse_or(vars, "DB_MAX_OPEN_CONNS", DEFAULT_DB_MAX_OPEN_CONNS)?,
            )?,
            db_max_idle_time: Duration::from_secs(parse_or(
                vars,
                "DB_MAX_IDLE_TIME_SECONDS",
                DEFAULT_DB_MAX_IDLE_TIME_SECONDS,
            )?),
            db_query_timeout: Duration::from_secs(positive(
                "DB_QUERY_TIMEOUT_SECONDS",
                parse_or(
                    vars,
                    "DB_QUERY_TIMEOUT_SECONDS",
                    DEFAULT_DB_QUERY_TIMEOUT_SECONDS,
                )?,
            )?),
            redis_addr: string_or(vars, "REDIS_ADDR", DEFAULT_REDIS_ADDR),
            redis_enabled: parse_or(vars, "REDIS_ENABLED", false)?,
            cache_ttl: Duration::from_secs(positive(
                "CACHE_TTL_SECONDS",
                parse_or(vars, "CACHE_TTL_SECONDS", DEFAULT_CACHE_TTL_SECONDS)?,
            )?),
            rate_limit,
            jwt,
            basic_auth_user: string_or(vars, "BASIC_AUTH_USER", DEFAULT_BASIC_AUTH_USER),
            basic_auth_pass: SecretString::from(required(vars, "BASIC_AUTH_PASS")?),
            bcrypt_cost,
            mail,
            drain: Duration::from_secs(parse_or(vars, "DRAIN_SECONDS", default_drain)?),
            env: env_name,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://user:pw@localhost/social".to_string(),
            ),
            ("JWT_SECRET".to_string(), "jwt-secret-value".to_string()),
            ("BASIC_AUTH_PASS".to_string(), "basic-secret".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.frontend_url, DEFAULT_FRONTEND_URL);
        assert_eq!(config.env, "development");
        assert_eq!(config.db_query_timeout, Duration::from_secs(5));
        assert!(!config.redis_enabled);
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
        assert_eq!(config.jwt.expiry_seconds, 259_200);
        assert_eq!(config.jwt.secret.expose_secret(), "jwt-secret-value");
        assert_eq!(config.basic_auth_user, "admin");
        assert_eq!(config.mail.smtp_port, 2525);
        assert!(config.mail.smtp_password.is_none());
        assert_eq!(config.mail.invitation_expiry_seconds, 1800);
        assert_eq!(config.drain, Duration::ZERO);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("ENV".to_string(), "production".to_string());
        vars.insert("FRONTEND_URL".to_string(), "https://social.example/".to_string());
        vars.insert("RATELIMITER_REQUESTS_COUNT".to_string(), "50".to_string());
        vars.insert("RATELIMITER_TIME_FRAME_SECONDS".to_string(), "60".to_string());
        vars.insert("RATELIMITER_ENABLED".to_string(), "false".to_string());
        vars.insert("REDIS_ENABLED".to_string(), "true".to_string());
        vars.insert("SMTP_PASSWORD".to_string(), "smtp-secret".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.frontend_url, "https://social.example");
        assert_eq!(config.rate_limit.requests_per_time_frame, 50);
        assert_eq!(config.rate_limit.time_frame, Duration::from_secs(60));
        assert!(!config.rate_limit.enabled);
        assert!(config.redis_enabled);
        assert!(config.mail.smtp_password.is_some());
        assert_eq!(config.drain, Duration::from_secs(30));
    }

    #[test]
    fn test_from_vars_missing_database_url() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_from_vars_missing_jwt_secret() {
        let mut vars = base_vars();
        vars.remove("JWT_SECRET");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "JWT_SECRET"));
    }

    #[test]
    fn test_rate_limit_rejects_zero_requests() {
        let mut vars = base_vars();
        vars.insert("RATELIMITER_REQUESTS_COUNT".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "RATELIMITER_REQUESTS_COUNT")
        );
    }

    #[test]
    fn test_cache_ttl_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("CACHE_TTL_SECONDS".to_string(), "a day".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "CACHE_TTL_SECONDS")
        );
    }

    #[test]
    fn test_bcrypt_cost_rejects_out_of_range() {
        let mut vars = base_vars();
        vars.insert("BCRYPT_COST".to_string(), "3".to_string());
        assert!(Config::from_vars(&vars).is_err());

        vars.insert("BCRYPT_COST".to_string(), "4".to_string());
        assert_eq!(Config::from_vars(&vars).unwrap().bcrypt_cost, 4);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = base_vars();
        vars.insert("SMTP_PASSWORD".to_string(), "smtp-secret".to_string());
        let config = Config::from_vars(&vars).unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("jwt-secret-value"));
        assert!(!debug.contains("basic-secret"));
        assert!(!debug.contains("smtp-secret"));
        assert!(!debug.contains("user:pw"));
        assert!(debug.contains("[REDACTED]"));
    }
}
