// src/presentation/http/routes.rs
use crate::presentation::http::state::HttpState;
use crate::presentation::http::{
    controllers::{auth, oauth},
    middleware::ip_rate_limit,
    openapi::{self, StatusResponse},
};
use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: HttpState) -> Router {
    build_router_with_rate_limiter(state, true)
}

/// Router with the per-IP limiter optionally left out, for harnesses that
/// drive many requests from one address.
pub fn build_router_with_rate_limiter(state: HttpState, rate_limited: bool) -> Router {
    let router = Router::new()
        .merge(openapi::docs_router())
        .route("/health", get(health))
        .route("/auth/verification/send", post(auth::send_code))
        .route("/auth/verification/verify", post(auth::verify_code))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout/center", post(auth::logout_center))
        .route("/auth/userinfo", get(auth::userinfo))
        .route("/auth/authorize", get(oauth::authorize))
        .route("/auth/token", post(oauth::token))
        .route("/auth/refresh", post(oauth::refresh))
        .route("/auth/logout/token", post(oauth::logout_token));

    let router = if rate_limited {
        router.layer(from_fn_with_state(state.clone(), ip_rate_limit))
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.allowed_origins))
        .layer(Extension(state))
}

/// Credentialed CORS restricted to the configured origins; the session
/// cookie has to travel with cross-origin requests from client apps.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check.", body = crate::presentation::http::openapi::StatusResponse)
    ),
    tag = "System"
)]
pub async fn health() -> axum::Json<StatusResponse> {
    axum::Json(StatusResponse {
        status: "ok".into(),
    })
}
