// tests/support/helpers.rs
use super::mocks::{self, ManualClock, PlainPasswordHasher, RecordingMailer};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode, header};
use pkce_sso::application::{
    ports::{kv_store::ExpiringKvStore, time::Clock},
    services::{
        ApplicationServices, ServicePorts, ServiceSettings,
        pkce::s256_challenge,
        rate_limiter::{FailurePolicy, RateLimitConfig},
    },
};
use pkce_sso::config::DeploymentMode;
use pkce_sso::infrastructure::{
    repositories::InMemoryUserDirectory, security::JwtTokenSigner, store::InMemoryKvStore,
};
use pkce_sso::presentation::http::{
    routes::build_router_with_rate_limiter, session::SessionCookies, state::HttpState,
};
use serde_json::Value;
use std::sync::Arc;

pub const ACCESS_SECRET: &str = "access-secret-access-secret-access-secret";
pub const REFRESH_SECRET: &str = "refresh-secret-refresh-secret-refresh-secret";
pub const SESSION_SECRET: &str = "session-secret-session-secret-session-secret";
pub const CLIENT_REDIRECT: &str = "http://localhost:8080";
pub const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

/// Everything a test may want to poke at besides the services themselves.
pub struct TestApp {
    pub services: Arc<ApplicationServices>,
    pub store: Arc<InMemoryKvStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
}

pub fn test_settings(mode: DeploymentMode) -> ServiceSettings {
    ServiceSettings {
        mode,
        redirect_whitelist: vec![CLIENT_REDIRECT.into(), "http://localhost:5173".into()],
        ip_limit: RateLimitConfig::new("rate:ip", 60_000, 200),
        email_limit: RateLimitConfig::new("rate:email", 60_000, 2),
        failure_policy: FailurePolicy::Closed,
    }
}

pub async fn build_test_app() -> TestApp {
    build_test_app_with(test_settings(DeploymentMode::Test)).await
}

pub async fn build_test_app_with(settings: ServiceSettings) -> TestApp {
    let clock = ManualClock::new();
    let clock_port: Arc<dyn Clock> = clock.clone();
    let store = Arc::new(InMemoryKvStore::new(Arc::clone(&clock_port)));
    let store_port: Arc<dyn ExpiringKvStore> = store.clone();
    let users = Arc::new(mocks::seeded_directory().await);
    let mailer = Arc::new(RecordingMailer::default());

    let services = services_over(store_port, users.clone(), mailer.clone(), clock_port, settings);

    TestApp {
        services,
        store,
        users,
        mailer,
        clock,
    }
}

/// Services wired to an arbitrary store, e.g. [`mocks::FailingStore`] or Redis.
pub fn services_over(
    store: Arc<dyn ExpiringKvStore>,
    users: Arc<InMemoryUserDirectory>,
    mailer: Arc<RecordingMailer>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
) -> Arc<ApplicationServices> {
    let signer = Arc::new(JwtTokenSigner::new(
        ACCESS_SECRET,
        REFRESH_SECRET,
        Arc::clone(&clock),
    ));
    Arc::new(ApplicationServices::new(
        ServicePorts {
            store,
            users,
            signer,
            password_hasher: Arc::new(PlainPasswordHasher),
            mailer,
            clock,
        },
        settings,
    ))
}

pub fn build_test_state(services: Arc<ApplicationServices>) -> HttpState {
    HttpState {
        services,
        cookies: SessionCookies::new(SESSION_SECRET, false),
        allowed_origins: Arc::from(vec![CLIENT_REDIRECT.to_string()]),
    }
}

pub fn make_test_router(app: &TestApp) -> axum::Router {
    build_router_with_rate_limiter(build_test_state(Arc::clone(&app.services)), false)
}

pub fn challenge() -> String {
    s256_challenge(VERIFIER)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Assert that a response is an ErrorResponse JSON with the expected status and error string.
pub async fn assert_error_response(
    resp: axum::response::Response,
    expected_status: StatusCode,
    expected_error: &str,
) -> Value {
    assert_eq!(resp.status(), expected_status);
    let ct = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(ct.starts_with("application/json"), "unexpected content-type: {ct}");
    let json = body_json(resp).await;
    assert_eq!(json["error"], expected_error, "unexpected error body: {json}");
    assert!(
        json["message"].as_str().is_some_and(|m| !m.is_empty()),
        "expected non-empty message field in ErrorResponse"
    );
    json
}
