// src/application/ports/security.rs
use crate::application::ApplicationResult;
use crate::domain::{
    token::TokenType,
    user::{UserId, UserProfile},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> ApplicationResult<String>;
    async fn verify(&self, password: &str, expected_hash: &str) -> ApplicationResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub email: String,
    pub name: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenVerifyError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Compact signed tokens. Access and refresh tokens are signed with
/// independent secrets, so neither kind can be forged from the other.
pub trait TokenSigner: Send + Sync {
    fn sign_access(&self, profile: &UserProfile) -> ApplicationResult<String>;

    /// Every refresh token carries a fresh `jti`, so two tokens for the same
    /// user never compare equal.
    fn sign_refresh(&self, user_id: UserId) -> ApplicationResult<String>;

    /// With `allow_expired` the signature and `type` are still enforced.
    fn verify_access(
        &self,
        token: &str,
        allow_expired: bool,
    ) -> Result<AccessClaims, TokenVerifyError>;

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenVerifyError>;
}
