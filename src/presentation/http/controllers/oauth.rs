// src/presentation/http/controllers/oauth.rs
use crate::application::dto::{
    AuthorizationRedirect, AuthorizeOutcome, AuthorizeRequest, TokenResponse,
};
use crate::domain::errors::AuthError;
use crate::presentation::http::error::{HttpError, HttpResult, IntoHttpResult};
use crate::presentation::http::extractors::{CurrentSession, JsonBody, MaybeBearerToken};
use crate::presentation::http::state::HttpState;
use axum::{
    Extension, Json,
    extract::Query,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub code: String,
    pub code_verifier: Option<String>,
}

/// The access token may come in the body or as a bearer header.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    pub revoked: bool,
}

#[utoipa::path(
    get,
    path = "/auth/authorize",
    params(AuthorizeRequest),
    responses(
        (status = 200, description = "Authorization code issued; redirect the user agent to `redirect_uri` with it.", body = AuthorizationRedirect),
        (status = 400, description = "Invalid redirect_uri or PKCE parameters.", body = crate::presentation::http::error::ErrorResponse),
        (status = 401, description = "No central session; the user must log in first.", body = crate::presentation::http::error::ErrorResponse),
        (status = 429, description = "Too many requests.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn authorize(
    Extension(state): Extension<HttpState>,
    session: CurrentSession,
    Query(request): Query<AuthorizeRequest>,
) -> HttpResult<Json<AuthorizationRedirect>> {
    let outcome = state
        .services
        .flow
        .authorize(&session.facts, request)
        .await
        .into_http()?;

    match outcome {
        AuthorizeOutcome::CodeIssued(redirect) => Ok(Json(redirect)),
        AuthorizeOutcome::NeedLogin => Err(HttpError::from_error(AuthError::LoginRequired.into())),
    }
}

#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token pair for the code's owner.", body = TokenResponse),
        (status = 400, description = "Missing verifier, or invalid, expired or already used code.", body = crate::presentation::http::error::ErrorResponse),
        (status = 503, description = "Store unavailable.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn token(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> HttpResult<Json<TokenResponse>> {
    state
        .services
        .flow
        .exchange_code(&payload.code, payload.code_verifier.as_deref())
        .await
        .into_http()
        .map(|pair| Json(state.services.tokens.token_response(pair)))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair.", body = TokenResponse),
        (status = 401, description = "Invalid, expired, mismatched or superseded tokens.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn refresh(
    Extension(state): Extension<HttpState>,
    MaybeBearerToken(bearer): MaybeBearerToken,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> HttpResult<Json<TokenResponse>> {
    let access_token = payload
        .access_token
        .or(bearer)
        .ok_or_else(|| HttpError::from_error(AuthError::InvalidAccessToken.into()))?;

    state
        .services
        .flow
        .refresh(&payload.refresh_token, &access_token)
        .await
        .into_http()
        .map(|pair| Json(state.services.tokens.token_response(pair)))
}

#[utoipa::path(
    post,
    path = "/auth/logout/token",
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "`revoked` is false when the token was already revoked or superseded.", body = RevokeResponse),
        (status = 401, description = "Refresh token does not verify.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn logout_token(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<RevokeRequest>,
) -> HttpResult<Json<RevokeResponse>> {
    state
        .services
        .flow
        .revoke(&payload.refresh_token)
        .await
        .into_http()
        .map(|revoked| Json(RevokeResponse { revoked }))
}
