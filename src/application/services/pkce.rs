// src/application/services/pkce.rs
use super::secrets::constant_time_eq;
use crate::domain::{
    authorization::{AuthorizationGrant, ChallengeMethod},
    errors::AuthError,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Check the verifier presented at the token step against the challenge
/// stored with the authorization code.
pub fn verify(verifier: Option<&str>, grant: &AuthorizationGrant) -> Result<(), AuthError> {
    let verifier = verifier
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingCodeVerifier)?;

    // Records are only ever written with S256; anything else is corrupt.
    let method: ChallengeMethod = grant.code_challenge_method.parse().map_err(|_| {
        tracing::error!(
            method = %grant.code_challenge_method,
            "stored authorization code carries an unsupported challenge method"
        );
        AuthError::UnsupportedChallengeMethod
    })?;

    let computed = match method {
        ChallengeMethod::S256 => s256_challenge(verifier),
    };

    if constant_time_eq(&computed, &grant.code_challenge) {
        Ok(())
    } else {
        Err(AuthError::PkceVerificationFailed)
    }
}
