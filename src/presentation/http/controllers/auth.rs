// src/presentation/http/controllers/auth.rs
use crate::application::{
    dto::UserInfoDto,
    services::accounts::{LoginCommand, RegisterCommand},
};
use crate::domain::verification::VerificationPurpose;
use crate::presentation::http::error::{HttpResult, IntoHttpResult};
use crate::presentation::http::extractors::{BearerToken, CurrentSession, JsonBody};
use crate::presentation::http::openapi::StatusResponse;
use crate::presentation::http::state::HttpState;
use axum::{
    Extension, Json,
    http::{HeaderMap, StatusCode, header},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub email: Option<String>,
    pub purpose: VerificationPurpose,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
    pub purpose: VerificationPurpose,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: Option<String>,
    #[serde(alias = "code")]
    pub verification_code: String,
}

/// Either `code` or `password` must be present; `code` wins when both are.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub code: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserInfoDto,
}

#[utoipa::path(
    post,
    path = "/auth/verification/send",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code issued, or silently ignored for an unknown login/reset address.", body = StatusResponse),
        (status = 400, description = "Missing or malformed email.", body = crate::presentation::http::error::ErrorResponse),
        (status = 409, description = "Email already registered.", body = crate::presentation::http::error::ErrorResponse),
        (status = 429, description = "Too many codes requested for this email.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn send_code(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<SendCodeRequest>,
) -> HttpResult<Json<StatusResponse>> {
    state
        .services
        .accounts
        .send_verification_code(payload.email.as_deref(), payload.purpose)
        .await
        .into_http()?;

    Ok(Json(StatusResponse {
        status: "sent".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/verification/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Whether the code matched. A matching code is consumed.", body = VerifyCodeResponse),
        (status = 400, description = "Malformed email.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn verify_code(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<VerifyCodeRequest>,
) -> HttpResult<Json<VerifyCodeResponse>> {
    state
        .services
        .accounts
        .verify_code(&payload.email, &payload.code, payload.purpose)
        .await
        .into_http()
        .map(|valid| Json(VerifyCodeResponse { valid }))
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered.", body = UserInfoDto),
        (status = 400, description = "Validation error.", body = crate::presentation::http::error::ErrorResponse),
        (status = 401, description = "Verification code rejected.", body = crate::presentation::http::error::ErrorResponse),
        (status = 409, description = "Email already registered.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> HttpResult<(StatusCode, Json<UserInfoDto>)> {
    let command = RegisterCommand {
        email: payload.email,
        name: payload.name,
        password: payload.password,
        verification_code: payload.verification_code,
    };

    let profile = state
        .services
        .accounts
        .register(command)
        .await
        .into_http()?;

    Ok((StatusCode::CREATED, Json(profile.into())))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; the session cookie is set.", body = LoginResponse),
        (status = 400, description = "Neither code nor password supplied.", body = crate::presentation::http::error::ErrorResponse),
        (status = 401, description = "Invalid credentials or code.", body = crate::presentation::http::error::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    Extension(state): Extension<HttpState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> HttpResult<(HeaderMap, Json<LoginResponse>)> {
    let command = LoginCommand {
        email: payload.email,
        code: payload.code,
        password: payload.password,
    };

    let result = state.services.accounts.login(command).await.into_http()?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = state.cookies.set_cookie(&result.session_id) {
        headers.insert(header::SET_COOKIE, cookie);
    } else {
        tracing::error!("session cookie could not be encoded");
    }

    Ok((
        headers,
        Json(LoginResponse {
            user: result.user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/logout/center",
    responses(
        (status = 200, description = "Central session ended and cookie cleared.", body = StatusResponse)
    ),
    tag = "Auth"
)]
pub async fn logout_center(
    Extension(state): Extension<HttpState>,
    session: CurrentSession,
) -> HttpResult<(HeaderMap, Json<StatusResponse>)> {
    if let Some(session_id) = session.session_id.as_deref() {
        state
            .services
            .accounts
            .logout(session_id)
            .await
            .into_http()?;
    }

    let mut headers = HeaderMap::new();
    if let Some(cookie) = state.cookies.clear_cookie() {
        headers.insert(header::SET_COOKIE, cookie);
    }

    Ok((
        headers,
        Json(StatusResponse {
            status: "logged_out".into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/auth/userinfo",
    responses(
        (status = 200, description = "Profile of the access token's subject.", body = UserInfoDto),
        (status = 401, description = "Missing, invalid or expired access token.", body = crate::presentation::http::error::ErrorResponse),
        (status = 404, description = "User no longer exists.", body = crate::presentation::http::error::ErrorResponse)
    ),
    security(("bearerAuth" = [])),
    tag = "Auth"
)]
pub async fn userinfo(
    Extension(state): Extension<HttpState>,
    BearerToken(token): BearerToken,
) -> HttpResult<Json<UserInfoDto>> {
    state
        .services
        .accounts
        .user_info(&token)
        .await
        .into_http()
        .map(Json)
}
