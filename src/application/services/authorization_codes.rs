// src/application/services/authorization_codes.rs
use super::secrets::random_url_token;
use crate::application::{
    ApplicationResult,
    error::ApplicationError,
    ports::{kv_store::ExpiringKvStore, time::Clock},
};
use crate::domain::{
    authorization::{
        AUTHORIZATION_CODE_TTL_SECS, AuthorizationCodeRecord, AuthorizationGrant, PkceChallenge,
    },
    errors::AuthError,
    user::UserId,
};
use std::{sync::Arc, time::Duration};

const KEY_PREFIX: &str = "code:";
const CODE_ENTROPY_BYTES: usize = 32;

pub struct AuthorizationCodeRegistry {
    store: Arc<dyn ExpiringKvStore>,
    clock: Arc<dyn Clock>,
}

impl AuthorizationCodeRegistry {
    pub fn new(store: Arc<dyn ExpiringKvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Mint a single-use code for `user_id`. PKCE is mandatory: a missing
    /// challenge or any method other than `S256` is refused.
    pub async fn issue(
        &self,
        user_id: UserId,
        code_challenge: Option<&str>,
        code_challenge_method: Option<&str>,
    ) -> ApplicationResult<String> {
        let challenge = PkceChallenge::parse(code_challenge, code_challenge_method)?;
        self.issue_with_challenge(user_id, &challenge).await
    }

    pub async fn issue_with_challenge(
        &self,
        user_id: UserId,
        challenge: &PkceChallenge,
    ) -> ApplicationResult<String> {
        let code = random_url_token(CODE_ENTROPY_BYTES);
        let record = AuthorizationCodeRecord::new(user_id, challenge, self.clock.now());
        let payload = serde_json::to_string(&record)
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))?;

        self.store
            .set(
                &key(&code),
                &payload,
                Duration::from_secs(AUTHORIZATION_CODE_TTL_SECS),
            )
            .await?;

        tracing::info!(user_id = %user_id, "authorization code issued");
        Ok(code)
    }

    /// Consume `code`. The record is removed atomically by whichever caller
    /// gets to it first, before any further checks, so a code is presented
    /// exactly once whatever the outcome of the PKCE step that follows.
    pub async fn redeem(&self, code: &str) -> ApplicationResult<AuthorizationGrant> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::InvalidAuthorizationCode.into());
        }

        let Some(payload) = self.store.take(&key(code)).await? else {
            tracing::warn!("authorization code redemption failed: unknown or already used");
            return Err(AuthError::InvalidAuthorizationCode.into());
        };

        let record: AuthorizationCodeRecord = match serde_json::from_str(&payload) {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(error = %err, "discarding unreadable authorization code record");
                return Err(AuthError::InvalidAuthorizationCode.into());
            }
        };

        if record.is_expired_at(self.clock.now()) {
            tracing::warn!(user_id = %record.user_id, "authorization code redemption failed: expired");
            return Err(AuthError::ExpiredAuthorizationCode.into());
        }

        tracing::info!(user_id = %record.user_id, "authorization code redeemed");
        Ok(record.into())
    }
}

fn key(code: &str) -> String {
    format!("{KEY_PREFIX}{code}")
}
