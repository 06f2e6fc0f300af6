// tests/rate_limiter.rs
mod support;

use pkce_sso::application::{
    ErrorKind,
    error::ApplicationError,
    ports::{kv_store::ExpiringKvStore, time::Clock},
    services::rate_limiter::{FailurePolicy, RateLimitConfig, RateLimiter},
};
use pkce_sso::infrastructure::store::InMemoryKvStore;
use std::sync::Arc;
use support::{FailingStore, ManualClock};

fn limiter(clock: &Arc<ManualClock>) -> RateLimiter {
    let clock: Arc<dyn Clock> = clock.clone();
    let store: Arc<dyn ExpiringKvStore> = Arc::new(InMemoryKvStore::new(clock));
    RateLimiter::new(store, FailurePolicy::Closed)
}

#[tokio::test]
async fn requests_beyond_the_limit_are_denied_with_retry_after() {
    let clock = ManualClock::new();
    let limiter = limiter(&clock);
    let config = RateLimitConfig::new("rate:ip", 60_000, 3);

    for expected_remaining in [2, 1, 0] {
        let decision = limiter.allow("10.0.0.1", &config).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
    }

    clock.advance_secs(15);
    let denied = limiter.allow("10.0.0.1", &config).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert!(denied.retry_after_secs >= 1 && denied.retry_after_secs <= 45);
}

#[tokio::test]
async fn window_resets_after_expiry() {
    let clock = ManualClock::new();
    let limiter = limiter(&clock);
    let config = RateLimitConfig::new("rate:email", 60_000, 2);

    assert!(limiter.allow("a@example.com", &config).await.unwrap().allowed);
    assert!(limiter.allow("a@example.com", &config).await.unwrap().allowed);
    assert!(!limiter.allow("a@example.com", &config).await.unwrap().allowed);

    clock.advance_secs(61);
    assert!(limiter.allow("a@example.com", &config).await.unwrap().allowed);
}

#[tokio::test]
async fn identifiers_and_prefixes_are_counted_separately() {
    let clock = ManualClock::new();
    let limiter = limiter(&clock);
    let ip = RateLimitConfig::new("rate:ip", 60_000, 1);
    let email = RateLimitConfig::new("rate:email", 60_000, 1);

    assert!(limiter.allow("x", &ip).await.unwrap().allowed);
    assert!(limiter.allow("y", &ip).await.unwrap().allowed);
    assert!(limiter.allow("x", &email).await.unwrap().allowed);
    assert!(!limiter.allow("x", &ip).await.unwrap().allowed);
}

#[tokio::test]
async fn missing_identifier_is_not_limited() {
    let clock = ManualClock::new();
    let limiter = limiter(&clock);
    let config = RateLimitConfig::new("rate:ip", 60_000, 0);

    assert_eq!(limiter.check(None, &config).await.unwrap(), None);
    assert_eq!(limiter.check(Some("  "), &config).await.unwrap(), None);
    assert!(limiter.enforce(None, &config).await.is_ok());
}

#[tokio::test]
async fn enforce_turns_denial_into_rate_limited_error() {
    let clock = ManualClock::new();
    let limiter = limiter(&clock);
    let config = RateLimitConfig::new("rate:email", 60_000, 1);

    limiter.enforce(Some("a@example.com"), &config).await.unwrap();
    let err = limiter
        .enforce(Some("a@example.com"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(matches!(err, ApplicationError::RateLimited { retry_after_secs } if retry_after_secs > 0));
}

#[tokio::test]
async fn store_failure_is_surfaced_when_failing_closed() {
    let limiter = RateLimiter::new(Arc::new(FailingStore), FailurePolicy::Closed);
    let config = RateLimitConfig::new("rate:ip", 60_000, 5);

    let err = limiter.allow("10.0.0.1", &config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
}

#[tokio::test]
async fn store_failure_lets_requests_through_when_failing_open() {
    let limiter = RateLimiter::new(Arc::new(FailingStore), FailurePolicy::Open);
    let config = RateLimitConfig::new("rate:ip", 60_000, 5);

    let decision = limiter.allow("10.0.0.1", &config).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(limiter.failure_policy(), FailurePolicy::Open);
}
