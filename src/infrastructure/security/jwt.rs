// src/infrastructure/security/jwt.rs
use crate::application::{
    error::{ApplicationError, ApplicationResult},
    ports::{
        security::{AccessClaims, RefreshClaims, TokenSigner, TokenVerifyError},
        time::Clock,
    },
};
use crate::domain::{
    token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenType},
    user::{UserId, UserProfile},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use uuid::Uuid;

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// HS256 signer. Expiry is checked against the injected clock rather than
/// the library's wall clock, with no leeway.
pub struct JwtTokenSigner {
    access: KeyPair,
    refresh: KeyPair,
    clock: Arc<dyn Clock>,
}

impl JwtTokenSigner {
    pub fn new(access_secret: &str, refresh_secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            clock,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }

    fn decode<T: DeserializeOwned>(
        token: &str,
        key: &DecodingKey,
    ) -> Result<T, TokenVerifyError> {
        decode::<T>(token, key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenVerifyError::Expired,
                _ => TokenVerifyError::Invalid(err.to_string()),
            })
    }

    fn check_expiry(&self, exp: i64) -> Result<(), TokenVerifyError> {
        if self.clock.unix_timestamp() >= exp {
            Err(TokenVerifyError::Expired)
        } else {
            Ok(())
        }
    }

    fn sign<T: serde::Serialize>(claims: &T, key: &EncodingKey) -> ApplicationResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, key)
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))
    }
}

fn ttl_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

impl TokenSigner for JwtTokenSigner {
    fn sign_access(&self, profile: &UserProfile) -> ApplicationResult<String> {
        let iat = self.clock.unix_timestamp();
        let claims = AccessClaims {
            sub: profile.id,
            email: profile.email.to_string(),
            name: profile.name.to_string(),
            token_type: TokenType::Access,
            iat,
            exp: iat.saturating_add(ttl_secs(ACCESS_TOKEN_TTL_SECS)),
        };
        Self::sign(&claims, &self.access.encoding)
    }

    fn sign_refresh(&self, user_id: UserId) -> ApplicationResult<String> {
        let iat = self.clock.unix_timestamp();
        let claims = RefreshClaims {
            sub: user_id,
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4().to_string(),
            iat,
            exp: iat.saturating_add(ttl_secs(REFRESH_TOKEN_TTL_SECS)),
        };
        Self::sign(&claims, &self.refresh.encoding)
    }

    fn verify_access(
        &self,
        token: &str,
        allow_expired: bool,
    ) -> Result<AccessClaims, TokenVerifyError> {
        let claims: AccessClaims = Self::decode(token, &self.access.decoding)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenVerifyError::Invalid("not an access token".into()));
        }
        if !allow_expired {
            self.check_expiry(claims.exp)?;
        }
        Ok(claims)
    }

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenVerifyError> {
        let claims: RefreshClaims = Self::decode(token, &self.refresh.decoding)?;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenVerifyError::Invalid("not a refresh token".into()));
        }
        self.check_expiry(claims.exp)?;
        Ok(claims)
    }
}
