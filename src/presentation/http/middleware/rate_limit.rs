// src/presentation/http/middleware/rate_limit.rs
use crate::application::{
    error::ApplicationError,
    services::rate_limiter::{RateLimitDecision, resolve_client_identifier},
};
use crate::presentation::http::{error::HttpError, state::HttpState};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Per-client fixed-window limit applied to every route.
///
/// The client is identified by `X-Real-IP`, then the first hop of
/// `X-Forwarded-For`, then the peer address. A request with no usable
/// identifier is let through uncounted.
pub async fn ip_rate_limit(
    State(state): State<HttpState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = client_identifier(&request);
    let config = state.services.ip_limit();

    let decision = match state
        .services
        .rate_limiter
        .check(identifier.as_deref(), config)
        .await
    {
        Ok(decision) => decision,
        Err(err) => return HttpError::from_error(err).into_response(),
    };

    match decision {
        Some(decision) if !decision.allowed => {
            let mut response = HttpError::from_error(ApplicationError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            })
            .into_response();
            add_rate_limit_headers(response.headers_mut(), &decision);
            response
        }
        Some(decision) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &decision);
            response
        }
        None => next.run(request).await,
    }
}

fn client_identifier(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    resolve_client_identifier(header("x-real-ip"), header("x-forwarded-for"), remote)
}

fn add_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
}
