// src/domain/token.rs
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TTL_SECS: u64 = 60 * 15;
pub const REFRESH_TOKEN_TTL_SECS: u64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// The single active credential set of a user, stored under `token:<user id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
