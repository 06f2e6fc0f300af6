// src/domain/errors.rs
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Named failures of the authorization protocol. Each maps onto one
/// caller-visible error kind; see `ApplicationError::kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing code_challenge")]
    MissingPkceChallenge,
    #[error("unsupported code_challenge_method: S256 is required")]
    UnsupportedChallengeMethod,
    #[error("invalid or expired authorization code")]
    InvalidAuthorizationCode,
    #[error("invalid or expired authorization code")]
    ExpiredAuthorizationCode,
    #[error("missing code_verifier")]
    MissingCodeVerifier,
    // Deliberately shares its message with `InvalidAuthorizationCode`.
    #[error("invalid or expired authorization code")]
    PkceVerificationFailed,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("access token and refresh token belong to different users")]
    TokenMismatch,
    #[error("refresh token has been invalidated")]
    RefreshTokenInvalidated,
    #[error("login required")]
    LoginRequired,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired verification code")]
    InvalidVerificationCode,
    #[error("token subject no longer exists")]
    UnknownSubject,
}
