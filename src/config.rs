// src/config.rs
use crate::application::services::rate_limiter::{FailurePolicy, RateLimitConfig};
use std::{env, fmt, str::FromStr, time::Duration};
use thiserror::Error;

const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    #[default]
    Production,
    Development,
    Test,
}

impl DeploymentMode {
    pub fn is_production(self) -> bool {
        matches!(self, DeploymentMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::Production => "production",
            DeploymentMode::Development => "development",
            DeploymentMode::Test => "test",
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(DeploymentMode::Production),
            "development" | "dev" => Ok(DeploymentMode::Development),
            "test" => Ok(DeploymentMode::Test),
            other => Err(ConfigError::Invalid(format!("unknown APP_ENV: {other}"))),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    mode: DeploymentMode,
    listen_addr: String,
    redis_url: Option<String>,
    store_key_prefix: String,
    store_sweep_interval: Duration,
    database_url: Option<String>,
    access_token_secret: String,
    refresh_token_secret: String,
    session_secret: String,
    redirect_whitelist: Vec<String>,
    allowed_origins: Vec<String>,
    ip_limit: RateLimitConfig,
    email_limit: RateLimitConfig,
    failure_policy: FailurePolicy,
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mode", &self.mode)
            .field("listen_addr", &self.listen_addr)
            .field("redis", &self.redis_url.is_some())
            .field("store_key_prefix", &self.store_key_prefix)
            .field("database", &self.database_url.is_some())
            .field("redirect_whitelist", &self.redirect_whitelist)
            .field("allowed_origins", &self.allowed_origins)
            .field("ip_limit", &self.ip_limit)
            .field("email_limit", &self.email_limit)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".into()
}

fn default_redirect_whitelist() -> Vec<String> {
    vec![
        "http://localhost:8080".into(),
        "http://localhost:5173".into(),
    ]
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8080".into(), "http://localhost:5173".into()]
}

impl AppConfig {
    /// Build configuration from the process environment. `.env` is read
    /// first, then `.env.<APP_ENV>` overrides it when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        if let Ok(mode) = env::var("APP_ENV") {
            dotenvy::from_filename_override(format!(".env.{}", mode.trim())).ok();
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = get("APP_ENV")
            .map(|v| v.parse::<DeploymentMode>())
            .transpose()?
            .unwrap_or_default();

        let access_token_secret = require_secret(&get, "ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = require_secret(&get, "REFRESH_TOKEN_SECRET")?;
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::Invalid(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".into(),
            ));
        }
        let session_secret = require_secret(&get, "SESSION_SECRET")?;

        let failure_policy = get("RATE_LIMIT_FAILURE_POLICY")
            .map(|v| v.parse::<FailurePolicy>().map_err(ConfigError::Invalid))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            mode,
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(default_listen_addr),
            redis_url: get("REDIS_URL"),
            store_key_prefix: lookup("STORE_KEY_PREFIX").unwrap_or_else(|| "sso:".into()),
            store_sweep_interval: Duration::from_secs(parse_or(
                &get,
                "STORE_SWEEP_INTERVAL_SECS",
                30,
            )?),
            database_url: get("DATABASE_URL"),
            access_token_secret,
            refresh_token_secret,
            session_secret,
            redirect_whitelist: get("REDIRECT_WHITELIST")
                .map(|v| split_list(&v))
                .unwrap_or_else(default_redirect_whitelist),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_else(default_allowed_origins),
            ip_limit: RateLimitConfig::new(
                "rate:ip",
                parse_or(&get, "RATE_LIMIT_IP_WINDOW_MS", 60_000)?,
                parse_or(&get, "RATE_LIMIT_IP_MAX_REQUESTS", 200)?,
            ),
            email_limit: RateLimitConfig::new(
                "rate:email",
                parse_or(&get, "RATE_LIMIT_EMAIL_WINDOW_MS", 60_000)?,
                parse_or(&get, "RATE_LIMIT_EMAIL_MAX_REQUESTS", 2)?,
            ),
            failure_policy,
        })
    }

    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref()
    }

    pub fn store_key_prefix(&self) -> &str {
        &self.store_key_prefix
    }

    pub fn store_sweep_interval(&self) -> Duration {
        self.store_sweep_interval
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn access_token_secret(&self) -> &str {
        &self.access_token_secret
    }

    pub fn refresh_token_secret(&self) -> &str {
        &self.refresh_token_secret
    }

    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    pub fn redirect_whitelist(&self) -> &[String] {
        &self.redirect_whitelist
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn ip_limit(&self) -> &RateLimitConfig {
        &self.ip_limit
    }

    pub fn email_limit(&self) -> &RateLimitConfig {
        &self.email_limit
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

fn require_secret<G>(get: &G, key: &'static str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = get(key).ok_or(ConfigError::Missing(key))?;
    if value.len() < MIN_SECRET_BYTES {
        return Err(ConfigError::Invalid(format!(
            "{key} must be at least {MIN_SECRET_BYTES} bytes"
        )));
    }
    Ok(value)
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{key} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
