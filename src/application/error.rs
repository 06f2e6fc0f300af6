// src/application/error.rs
use crate::domain::errors::{AuthError, DomainError};
use serde::Serialize;
use thiserror::Error;

pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Caller-visible classification of every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    NotFoundOrExpired,
    AuthenticationFailure,
    NotFound,
    Conflict,
    RateLimited,
    UpstreamUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::NotFoundOrExpired => "NotFoundOrExpired",
            ErrorKind::AuthenticationFailure => "AuthenticationFailure",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::UpstreamUnavailable => "UpstreamUnavailable",
        }
    }
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingPkceChallenge
            | AuthError::UnsupportedChallengeMethod
            | AuthError::MissingCodeVerifier => ErrorKind::ValidationError,
            AuthError::InvalidAuthorizationCode
            | AuthError::ExpiredAuthorizationCode
            | AuthError::PkceVerificationFailed => ErrorKind::NotFoundOrExpired,
            AuthError::InvalidAccessToken
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired
            | AuthError::TokenMismatch
            | AuthError::RefreshTokenInvalidated
            | AuthError::LoginRequired
            | AuthError::InvalidCredentials
            | AuthError::InvalidVerificationCode
            | AuthError::UnknownSubject => ErrorKind::AuthenticationFailure,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("too many requests, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

impl ApplicationError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::Domain(DomainError::Validation(_)) => ErrorKind::ValidationError,
            ApplicationError::Domain(DomainError::Conflict(_)) => ErrorKind::Conflict,
            ApplicationError::Domain(DomainError::NotFound(_)) => ErrorKind::NotFound,
            ApplicationError::Domain(DomainError::Persistence(_)) => {
                ErrorKind::UpstreamUnavailable
            }
            ApplicationError::Auth(auth) => auth.kind(),
            ApplicationError::Validation(_) => ErrorKind::ValidationError,
            ApplicationError::NotFound(_) => ErrorKind::NotFound,
            ApplicationError::Conflict(_) => ErrorKind::Conflict,
            ApplicationError::RateLimited { .. } => ErrorKind::RateLimited,
            ApplicationError::Infrastructure(_) => ErrorKind::UpstreamUnavailable,
        }
    }

    /// The named protocol failure, when there is one.
    pub fn auth_error(&self) -> Option<AuthError> {
        match self {
            ApplicationError::Auth(auth) => Some(*auth),
            _ => None,
        }
    }
}
