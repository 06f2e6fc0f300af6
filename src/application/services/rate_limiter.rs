// src/application/services/rate_limiter.rs
use crate::application::{
    error::{ApplicationError, ApplicationResult},
    ports::kv_store::ExpiringKvStore,
};
use std::{
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

/// Fixed-window limit for one class of requests. Counters live under
/// `<prefix>:<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub prefix: String,
    pub window_ms: u64,
    pub max_requests: u64,
}

impl RateLimitConfig {
    pub fn new(prefix: impl Into<String>, window_ms: u64, max_requests: u64) -> Self {
        Self {
            prefix: prefix.into(),
            window_ms,
            max_requests,
        }
    }

    /// Window length in whole seconds, rounded up and never zero.
    pub fn window_secs(&self) -> u64 {
        self.window_ms.div_ceil(1000).max(1)
    }

    fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.prefix, identifier)
    }
}

/// What to do when the store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Let the request through and log.
    Open,
    /// Surface the store failure to the caller.
    #[default]
    Closed,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(FailurePolicy::Open),
            "closed" => Ok(FailurePolicy::Closed),
            other => Err(format!("unknown rate limit failure policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub retry_after_secs: u64,
}

pub struct RateLimiter {
    store: Arc<dyn ExpiringKvStore>,
    failure_policy: FailurePolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn ExpiringKvStore>, failure_policy: FailurePolicy) -> Self {
        Self {
            store,
            failure_policy,
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Count one request for `identifier` and decide whether it may proceed.
    /// The increment is final even if the caller later fails.
    pub async fn allow(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
    ) -> ApplicationResult<RateLimitDecision> {
        match self.count(identifier, config).await {
            Ok(decision) => {
                if !decision.allowed {
                    tracing::warn!(
                        prefix = %config.prefix,
                        identifier,
                        limit = config.max_requests,
                        retry_after = decision.retry_after_secs,
                        "rate limit exceeded"
                    );
                }
                Ok(decision)
            }
            Err(err) => match self.failure_policy {
                FailurePolicy::Open => {
                    tracing::warn!(error = %err, prefix = %config.prefix, "rate limiter store unavailable, failing open");
                    Ok(RateLimitDecision {
                        allowed: true,
                        limit: config.max_requests,
                        remaining: config.max_requests,
                        retry_after_secs: 0,
                    })
                }
                FailurePolicy::Closed => {
                    tracing::error!(error = %err, prefix = %config.prefix, "rate limiter store unavailable, failing closed");
                    Err(err)
                }
            },
        }
    }

    /// Like [`allow`](Self::allow) but skips limiting entirely when there is no
    /// usable identifier, so absent keys never share one counter.
    pub async fn check(
        &self,
        identifier: Option<&str>,
        config: &RateLimitConfig,
    ) -> ApplicationResult<Option<RateLimitDecision>> {
        match identifier.map(str::trim).filter(|id| !id.is_empty()) {
            Some(identifier) => self.allow(identifier, config).await.map(Some),
            None => Ok(None),
        }
    }

    /// [`check`](Self::check), turning a denial into `ApplicationError::RateLimited`.
    pub async fn enforce(
        &self,
        identifier: Option<&str>,
        config: &RateLimitConfig,
    ) -> ApplicationResult<Option<RateLimitDecision>> {
        match self.check(identifier, config).await? {
            Some(decision) if !decision.allowed => Err(ApplicationError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            }),
            other => Ok(other),
        }
    }

    async fn count(
        &self,
        identifier: &str,
        config: &RateLimitConfig,
    ) -> ApplicationResult<RateLimitDecision> {
        let key = config.key(identifier);
        let window = Duration::from_secs(config.window_secs());

        let count = self.store.incr(&key).await?;
        if count == 1 {
            self.store.expire(&key, window).await?;
        }
        let count = u64::try_from(count).unwrap_or(0);

        if count > config.max_requests {
            let retry_after_secs = match self.store.ttl(&key).await? {
                Some(remaining) => remaining.as_secs().max(1),
                None => {
                    // The first-hit EXPIRE was lost; restart the window so the
                    // counter cannot stay pinned forever.
                    self.store.expire(&key, window).await?;
                    config.window_secs()
                }
            };
            return Ok(RateLimitDecision {
                allowed: false,
                limit: config.max_requests,
                remaining: 0,
                retry_after_secs,
            });
        }

        Ok(RateLimitDecision {
            allowed: true,
            limit: config.max_requests,
            remaining: config.max_requests - count,
            retry_after_secs: 0,
        })
    }
}

/// Pick the identifier for per-client limiting. Proxy headers win over the
/// transport address, and loopback spellings collapse onto `127.0.0.1`.
pub fn resolve_client_identifier(
    real_ip: Option<&str>,
    forwarded_for: Option<&str>,
    remote: Option<IpAddr>,
) -> Option<String> {
    fn first_hop(header: Option<&str>) -> Option<&str> {
        header
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
    let from_headers = first_hop(real_ip).or_else(|| first_hop(forwarded_for));

    match from_headers {
        Some(raw) => Some(normalize_identifier(raw)),
        None => remote.map(|ip| normalize_ip(ip).to_string()),
    }
}

fn normalize_identifier(raw: &str) -> String {
    match raw.parse::<IpAddr>() {
        Ok(ip) => normalize_ip(ip).to_string(),
        Err(_) => raw.to_string(),
    }
}

fn normalize_ip(ip: IpAddr) -> IpAddr {
    let ip = ip.to_canonical();
    if ip.is_loopback() && ip.is_ipv6() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        ip
    }
}
