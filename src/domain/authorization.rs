// src/domain/authorization.rs
use crate::domain::errors::AuthError;
use crate::domain::user::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifetime of an authorization code, both as record expiry and store TTL.
pub const AUTHORIZATION_CODE_TTL_SECS: u64 = 60 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeMethod {
    #[serde(rename = "S256")]
    S256,
}

impl ChallengeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeMethod::S256 => "S256",
        }
    }
}

impl fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeMethod {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("S256") {
            Ok(ChallengeMethod::S256)
        } else {
            Err(AuthError::UnsupportedChallengeMethod)
        }
    }
}

/// A validated PKCE challenge as presented at the authorize step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub challenge: String,
    pub method: ChallengeMethod,
}

impl PkceChallenge {
    /// Validates the raw authorize parameters. The challenge is mandatory; an
    /// absent method defaults to `S256` and anything else is refused.
    pub fn parse(challenge: Option<&str>, method: Option<&str>) -> Result<Self, AuthError> {
        let challenge = challenge
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingPkceChallenge)?;

        let method = match method.map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => raw.parse()?,
            None => ChallengeMethod::S256,
        };

        Ok(Self {
            challenge: challenge.to_string(),
            method,
        })
    }
}

/// What the store holds under `code:<code>`.
///
/// The method is kept as a plain string so a record written by anything other
/// than this crate is caught at verification time instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCodeRecord {
    pub user_id: UserId,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCodeRecord {
    pub fn new(user_id: UserId, challenge: &PkceChallenge, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            code_challenge: challenge.challenge.clone(),
            code_challenge_method: challenge.method.as_str().to_string(),
            created_at: now,
            expires_at: now + Duration::seconds(AUTHORIZATION_CODE_TTL_SECS as i64),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of a successful redemption, handed to the PKCE check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub user_id: UserId,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl From<AuthorizationCodeRecord> for AuthorizationGrant {
    fn from(record: AuthorizationCodeRecord) -> Self {
        Self {
            user_id: record.user_id,
            code_challenge: record.code_challenge,
            code_challenge_method: record.code_challenge_method,
        }
    }
}
