// src/presentation/http/error.rs
use crate::application::{ApplicationResult, ErrorKind, error::ApplicationError};
use crate::domain::errors::DomainError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const UPSTREAM_MESSAGE: &str = "service temporarily unavailable";

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    kind: ErrorKind,
    message: String,
    retry_after_secs: Option<u64>,
}

impl HttpError {
    pub fn from_error(err: ApplicationError) -> Self {
        let kind = err.kind();
        let status = status_for(kind);

        let retry_after_secs = match &err {
            ApplicationError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let message = match err {
            // Detail stays in the logs.
            ApplicationError::Infrastructure(detail)
            | ApplicationError::Domain(DomainError::Persistence(detail)) => {
                tracing::error!(error = %detail, "upstream failure");
                UPSTREAM_MESSAGE.to_string()
            }
            ApplicationError::Validation(msg)
            | ApplicationError::NotFound(msg)
            | ApplicationError::Conflict(msg)
            | ApplicationError::Domain(
                DomainError::Validation(msg) | DomainError::Conflict(msg) | DomainError::NotFound(msg),
            ) => msg,
            ApplicationError::Auth(auth) => auth.to_string(),
            ApplicationError::RateLimited { .. } => "too many requests".to_string(),
        };

        Self {
            status,
            kind,
            message,
            retry_after_secs,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError | ErrorKind::NotFoundOrExpired => StatusCode::BAD_REQUEST,
        ErrorKind::AuthenticationFailure => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<ApplicationError> for HttpError {
    fn from(err: ApplicationError) -> Self {
        Self::from_error(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let payload = ErrorResponse {
            error: self.kind.as_str().to_string(),
            message: self.message,
        };
        let mut response = (self.status, Json(payload)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// Body of every failure response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type HttpResult<T> = Result<T, HttpError>;

pub trait IntoHttpResult<T> {
    fn into_http(self) -> HttpResult<T>;
}

impl<T> IntoHttpResult<T> for ApplicationResult<T> {
    fn into_http(self) -> HttpResult<T> {
        self.map_err(HttpError::from_error)
    }
}
