// src/presentation/http/extractors.rs
use super::{
    error::HttpError,
    session::SESSION_COOKIE,
    state::HttpState,
};
use crate::application::{dto::SessionFacts, error::ApplicationError};
use crate::domain::errors::AuthError;
use axum::{
    Extension, Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};
use serde::de::DeserializeOwned;

async fn http_state<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<HttpState, HttpError> {
    let Extension(app_state) = Extension::<HttpState>::from_request_parts(parts, state)
        .await
        .map_err(|_| {
            HttpError::from_error(ApplicationError::infrastructure(
                "application state missing",
            ))
        })?;
    Ok(app_state)
}

/// The caller's central-login session. A missing, forged or expired cookie
/// yields an anonymous session rather than a rejection.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub session_id: Option<String>,
    pub facts: SessionFacts,
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = http_state(parts, state).await?;

        let session_id = parts
            .headers
            .typed_get::<Cookie>()
            .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_owned))
            .and_then(|value| app_state.cookies.verify(&value));

        let Some(session_id) = session_id else {
            return Ok(Self {
                session_id: None,
                facts: SessionFacts::anonymous(),
            });
        };

        let facts = app_state
            .services
            .sessions
            .load(&session_id)
            .await
            .map_err(HttpError::from_error)?;

        Ok(Self {
            session_id: Some(session_id),
            facts,
        })
    }
}

/// Raw bearer token from `Authorization`. Verification is left to the
/// handler because refresh accepts expired access tokens.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .map(|header| Self(header.token().to_string()))
            .ok_or_else(|| HttpError::from_error(AuthError::InvalidAccessToken.into()))
    }
}

/// Optional variant used where the token may also arrive in the body.
#[derive(Debug, Clone)]
pub struct MaybeBearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeBearerToken
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .typed_get::<Authorization<Bearer>>()
                .map(|header| header.token().to_string()),
        ))
    }
}

/// `Json<T>` whose rejections (bad content type, malformed JSON, missing
/// fields) come back as `ValidationError` bodies like every other failure.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection.body_text(), "request body rejected");
            HttpError::from_error(ApplicationError::validation(rejection.body_text()))
        })?;
        Ok(Self(value))
    }
}
