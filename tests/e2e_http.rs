// tests/e2e_http.rs
mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pkce_sso::application::services::rate_limiter::RateLimitConfig;
use pkce_sso::config::DeploymentMode;
use pkce_sso::presentation::http::routes::build_router;
use serde_json::json;
use std::sync::Arc;
use support::{
    ALICE_EMAIL, ALICE_PASSWORD, CLIENT_REDIRECT, FailingStore, ManualClock, RecordingMailer,
    TestApp, VERIFIER, assert_error_response, body_json, build_test_app, build_test_app_with,
    build_test_state, challenge, json_request, make_test_router, seeded_directory, services_over,
    test_settings,
};
use tower::ServiceExt;

fn authorize_uri(state: &str) -> String {
    let query = serde_urlencoded::to_string([
        ("redirect_uri", CLIENT_REDIRECT),
        ("state", state),
        ("code_challenge", challenge().as_str()),
        ("code_challenge_method", "S256"),
    ])
    .unwrap();
    format!("/auth/authorize?{query}")
}

/// `name=value` part of the Set-Cookie header, ready to send back.
fn session_cookie(resp: &axum::response::Response) -> String {
    resp.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn login_cookie(app: &TestApp) -> String {
    let resp = make_test_router(app)
        .oneshot(json_request(
            "POST",
            "/auth/login",
            json!({ "email": ALICE_EMAIL, "password": ALICE_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie(&resp)
}

async fn authorize_with_cookie(app: &TestApp, cookie: &str) -> axum::response::Response {
    make_test_router(app)
        .oneshot(
            Request::builder()
                .uri(authorize_uri("s1"))
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_works() {
    let app = build_test_app().await;
    let resp = make_test_router(&app)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn full_login_authorize_token_refresh_logout_flow() {
    let app = build_test_app().await;
    let cookie = login_cookie(&app).await;
    assert!(cookie.starts_with("sso_sess="));

    let resp = authorize_with_cookie(&app, &cookie).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let redirect = body_json(resp).await;
    assert_eq!(redirect["redirect_uri"], CLIENT_REDIRECT);
    assert_eq!(redirect["state"], "s1");
    let code = redirect["code"].as_str().unwrap().to_string();

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/token",
            json!({ "code": code, "code_verifier": VERIFIER }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tokens = body_json(resp).await;
    assert_eq!(tokens["token_type"], "Bearer");
    assert_eq!(tokens["expires_in"], 900);
    let access = tokens["access_token"].as_str().unwrap().to_string();
    let refresh = tokens["refresh_token"].as_str().unwrap().to_string();

    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .uri("/auth/userinfo")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["email"], ALICE_EMAIL);

    // Access token supplied as a bearer header rather than in the body.
    let mut req = json_request("POST", "/auth/refresh", json!({ "refresh_token": refresh }));
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {access}").parse().unwrap(),
    );
    let resp = make_test_router(&app).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = body_json(resp).await;
    let new_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, refresh);

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/refresh",
            json!({ "refresh_token": refresh, "access_token": access }),
        ))
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "AuthenticationFailure").await;

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/logout/token",
            json!({ "refresh_token": new_refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["revoked"], true);
}

#[tokio::test]
async fn authorize_without_session_requires_login() {
    let app = build_test_app().await;
    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .uri(authorize_uri("s"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "AuthenticationFailure").await;
}

#[tokio::test]
async fn forged_session_cookie_is_treated_as_anonymous() {
    let app = build_test_app().await;
    let cookie = login_cookie(&app).await;
    let forged = format!("{cookie}x");

    let resp = authorize_with_cookie(&app, &forged).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authorize_rejects_unlisted_redirect() {
    let app = build_test_app().await;
    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .uri("/auth/authorize?redirect_uri=http%3A%2F%2Fevil.example&code_challenge=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = assert_error_response(resp, StatusCode::BAD_REQUEST, "ValidationError").await;
    assert_eq!(body["message"], "invalid redirect_uri");
}

#[tokio::test]
async fn pkce_mismatch_and_unknown_code_look_the_same() {
    let app = build_test_app().await;
    let cookie = login_cookie(&app).await;
    let code = body_json(authorize_with_cookie(&app, &cookie).await).await["code"]
        .as_str()
        .unwrap()
        .to_string();

    let mismatch = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/token",
            json!({ "code": code, "code_verifier": "wrong-verifier" }),
        ))
        .await
        .unwrap();
    let mismatch = assert_error_response(mismatch, StatusCode::BAD_REQUEST, "NotFoundOrExpired").await;

    let unknown = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/token",
            json!({ "code": "does-not-exist", "code_verifier": VERIFIER }),
        ))
        .await
        .unwrap();
    let unknown = assert_error_response(unknown, StatusCode::BAD_REQUEST, "NotFoundOrExpired").await;

    assert_eq!(mismatch["message"], unknown["message"]);
}

#[tokio::test]
async fn token_request_without_verifier_keeps_the_code() {
    let app = build_test_app().await;
    let cookie = login_cookie(&app).await;
    let code = body_json(authorize_with_cookie(&app, &cookie).await).await["code"]
        .as_str()
        .unwrap()
        .to_string();

    let resp = make_test_router(&app)
        .oneshot(json_request("POST", "/auth/token", json!({ "code": code })))
        .await
        .unwrap();
    let body = assert_error_response(resp, StatusCode::BAD_REQUEST, "ValidationError").await;
    assert_eq!(body["message"], "missing code_verifier");

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/token",
            json!({ "code": code, "code_verifier": VERIFIER }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn incomplete_bodies_are_validation_errors() {
    let app = build_test_app().await;

    for uri in [
        "/auth/token",
        "/auth/refresh",
        "/auth/logout/token",
        "/auth/register",
        "/auth/login",
        "/auth/verification/verify",
    ] {
        let resp = make_test_router(&app)
            .oneshot(json_request("POST", uri, json!({})))
            .await
            .unwrap();
        assert_error_response(resp, StatusCode::BAD_REQUEST, "ValidationError").await;
    }
}

#[tokio::test]
async fn malformed_json_and_wrong_content_type_are_validation_errors() {
    let app = build_test_app().await;

    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::BAD_REQUEST, "ValidationError").await;

    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/refresh")
                .body(Body::from(r#"{"refresh_token":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::BAD_REQUEST, "ValidationError").await;
}

#[tokio::test]
async fn logout_center_clears_cookie_and_session() {
    let app = build_test_app().await;
    let cookie = login_cookie(&app).await;

    let resp = make_test_router(&app)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout/center")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.starts_with("sso_sess=;"));
    assert!(cleared.contains("Max-Age=0"));

    let resp = authorize_with_cookie(&app, &cookie).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_and_verification_endpoints() {
    let app = build_test_app().await;

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/verification/send",
            json!({ "email": "frank@example.com", "purpose": "register" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({ "email": "frank@example.com", "name": "Frank", "verification_code": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["email"], "frank@example.com");

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({ "email": "frank@example.com", "name": "Frank", "code": "123456" }),
        ))
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::CONFLICT, "Conflict").await;

    let resp = make_test_router(&app)
        .oneshot(json_request(
            "POST",
            "/auth/verification/verify",
            json!({ "email": "frank@example.com", "code": "999999", "purpose": "login" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["valid"], false);
}

#[tokio::test]
async fn userinfo_without_bearer_is_unauthorized() {
    let app = build_test_app().await;
    let resp = make_test_router(&app)
        .oneshot(Request::builder().uri("/auth/userinfo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_error_response(resp, StatusCode::UNAUTHORIZED, "AuthenticationFailure").await;
}

#[tokio::test]
async fn ip_rate_limit_applies_per_client() {
    let mut settings = test_settings(DeploymentMode::Test);
    settings.ip_limit = RateLimitConfig::new("rate:ip", 60_000, 2);
    let app = build_test_app_with(settings).await;
    let router = build_router(build_test_state(Arc::clone(&app.services)));

    let health_from = |ip: &str| {
        Request::builder()
            .uri("/health")
            .header("x-real-ip", ip)
            .body(Body::empty())
            .unwrap()
    };

    for remaining in ["1", "0"] {
        let resp = router.clone().oneshot(health_from("203.0.113.7")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-ratelimit-remaining"], remaining);
    }

    let resp = router.clone().oneshot(health_from("203.0.113.7")).await.unwrap();
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    assert_error_response(resp, StatusCode::TOO_MANY_REQUESTS, "RateLimited").await;

    let resp = router.oneshot(health_from("203.0.113.8")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn store_outage_is_reported_without_detail() {
    let clock = ManualClock::new();
    let services = services_over(
        Arc::new(FailingStore),
        Arc::new(seeded_directory().await),
        Arc::new(RecordingMailer::default()),
        clock,
        test_settings(DeploymentMode::Test),
    );
    let router = build_router(build_test_state(services));

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-real-ip", "203.0.113.7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = assert_error_response(resp, StatusCode::SERVICE_UNAVAILABLE, "UpstreamUnavailable").await;
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_app().await;
    let resp = make_test_router(&app)
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await;
    assert!(doc["paths"]["/auth/token"].is_object());
}
