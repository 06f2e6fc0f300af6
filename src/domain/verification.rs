// src/domain/verification.rs
use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const VERIFICATION_CODE_TTL_SECS: u64 = 60 * 10;
pub const VERIFICATION_CODE_DIGITS: usize = 6;

/// What a verification code proves ownership of the email *for*. Codes are
/// keyed per purpose, so a `login` code never satisfies `register`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationPurpose {
    Register,
    Login,
    Reset,
}

impl VerificationPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationPurpose::Register => "register",
            VerificationPurpose::Login => "login",
            VerificationPurpose::Reset => "reset",
        }
    }
}

impl fmt::Display for VerificationPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationPurpose {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "register" => Ok(VerificationPurpose::Register),
            "login" => Ok(VerificationPurpose::Login),
            "reset" => Ok(VerificationPurpose::Reset),
            other => Err(DomainError::Validation(format!(
                "unknown verification purpose: {other}"
            ))),
        }
    }
}
