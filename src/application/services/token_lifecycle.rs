// src/application/services/token_lifecycle.rs
use super::secrets::constant_time_eq;
use crate::application::{
    ApplicationResult,
    dto::TokenResponse,
    error::ApplicationError,
    ports::{
        kv_store::ExpiringKvStore,
        security::{AccessClaims, TokenSigner, TokenVerifyError},
        time::Clock,
    },
};
use crate::domain::{
    errors::AuthError,
    token::{REFRESH_TOKEN_TTL_SECS, TokenPair},
    user::{UserDirectory, UserId, UserProfile},
};
use std::{sync::Arc, time::Duration};

const KEY_PREFIX: &str = "token:";

/// Issues, rotates and revokes token pairs.
///
/// Each user has at most one stored pair. The store, not the signature, is
/// authoritative for whether a refresh token is still current: a refresh token
/// is honoured only while it is byte-for-byte the one stored for its subject.
pub struct TokenLifecycleManager {
    store: Arc<dyn ExpiringKvStore>,
    signer: Arc<dyn TokenSigner>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl TokenLifecycleManager {
    pub fn new(
        store: Arc<dyn ExpiringKvStore>,
        signer: Arc<dyn TokenSigner>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            signer,
            users,
            clock,
        }
    }

    /// Mint a new pair and store it, silently superseding whatever pair the
    /// user had before. Concurrent calls for one user are last-writer-wins.
    pub async fn issue_pair(&self, user_id: UserId) -> ApplicationResult<TokenPair> {
        let profile = self.load_profile(user_id).await?;
        let pair = self.mint(&profile)?;
        let payload = encode_pair(&pair)?;

        self.store.set(&key(user_id), &payload, pair_ttl()).await?;
        tracing::info!(user_id = %user_id, "token pair issued");
        Ok(pair)
    }

    /// The currently stored pair, provided its refresh token still verifies.
    /// Any verification failure yields `None` so the caller mints a new pair.
    pub async fn redeem_existing(&self, user_id: UserId) -> ApplicationResult<Option<TokenPair>> {
        let Some((_, pair)) = self.load_pair(user_id).await? else {
            return Ok(None);
        };

        match self.signer.verify_refresh(&pair.refresh_token) {
            Ok(claims) if claims.sub == user_id => {
                tracing::debug!(user_id = %user_id, "reusing stored token pair");
                Ok(Some(pair))
            }
            Ok(_) => {
                tracing::warn!(user_id = %user_id, "stored refresh token names another subject");
                Ok(None)
            }
            Err(err) => {
                tracing::debug!(user_id = %user_id, error = %err, "stored refresh token no longer verifies");
                Ok(None)
            }
        }
    }

    /// Rotate the pair. The access token may be expired but must be genuine;
    /// the refresh token must be valid, unexpired and still the stored one.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        access_token: &str,
    ) -> ApplicationResult<TokenPair> {
        let access = self
            .signer
            .verify_access(access_token, true)
            .map_err(|_| AuthError::InvalidAccessToken)?;
        let refresh = self
            .signer
            .verify_refresh(refresh_token)
            .map_err(refresh_error)?;

        if access.sub != refresh.sub {
            tracing::warn!(access_sub = %access.sub, refresh_sub = %refresh.sub, "refresh rejected: token subjects differ");
            return Err(AuthError::TokenMismatch.into());
        }
        let user_id = refresh.sub;

        let Some((stored_raw, stored)) = self.load_pair(user_id).await? else {
            tracing::warn!(user_id = %user_id, "refresh rejected: no active token pair");
            return Err(AuthError::RefreshTokenInvalidated.into());
        };
        if !constant_time_eq(&stored.refresh_token, refresh_token) {
            tracing::warn!(user_id = %user_id, "refresh rejected: refresh token superseded");
            return Err(AuthError::RefreshTokenInvalidated.into());
        }

        let profile = self.load_profile(user_id).await?;
        let rotated = self.mint(&profile)?;
        let payload = encode_pair(&rotated)?;

        let swapped = self
            .store
            .compare_and_swap(&key(user_id), &stored_raw, &payload, pair_ttl())
            .await?;
        if !swapped {
            tracing::warn!(user_id = %user_id, "refresh rejected: pair changed concurrently");
            return Err(AuthError::RefreshTokenInvalidated.into());
        }

        tracing::info!(user_id = %user_id, "token pair rotated");
        Ok(rotated)
    }

    /// Drop the user's stored pair if `refresh_token` is still the current
    /// one. An already revoked or superseded token is reported as `false`.
    pub async fn revoke(&self, refresh_token: &str) -> ApplicationResult<bool> {
        let claims = self
            .signer
            .verify_refresh(refresh_token)
            .map_err(refresh_error)?;

        let Some((stored_raw, stored)) = self.load_pair(claims.sub).await? else {
            tracing::info!(user_id = %claims.sub, "revoke ignored: no active token pair");
            return Ok(false);
        };
        if !constant_time_eq(&stored.refresh_token, refresh_token) {
            tracing::info!(user_id = %claims.sub, "revoke ignored: refresh token not current");
            return Ok(false);
        }

        let removed = self
            .store
            .compare_and_delete(&key(claims.sub), &stored_raw)
            .await?;
        if removed {
            tracing::info!(user_id = %claims.sub, "token pair revoked");
        }
        Ok(removed)
    }

    /// Administrative bulk removal of every stored pair.
    pub async fn clear_all(&self) -> ApplicationResult<u64> {
        let removed = self.store.delete_prefix(KEY_PREFIX).await?;
        tracing::warn!(removed, "cleared all stored token pairs");
        Ok(removed)
    }

    /// Wire form of a pair. `expires_in` counts down from the access token's
    /// `exp` and is zero once it has lapsed.
    pub fn token_response(&self, pair: TokenPair) -> TokenResponse {
        let expires_in = match self.signer.verify_access(&pair.access_token, true) {
            Ok(claims) => u64::try_from(claims.exp - self.clock.unix_timestamp()).unwrap_or(0),
            Err(err) => {
                tracing::error!(error = %err, "issued access token does not verify");
                0
            }
        };
        TokenResponse::new(pair, expires_in)
    }

    /// Validate a bearer access token for resource access.
    pub fn authenticate(&self, access_token: &str) -> ApplicationResult<AccessClaims> {
        self.signer
            .verify_access(access_token, false)
            .map_err(|_| AuthError::InvalidAccessToken.into())
    }

    fn mint(&self, profile: &UserProfile) -> ApplicationResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.signer.sign_access(profile)?,
            refresh_token: self.signer.sign_refresh(profile.id)?,
        })
    }

    async fn load_profile(&self, user_id: UserId) -> ApplicationResult<UserProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownSubject)?;
        Ok(user.profile())
    }

    async fn load_pair(&self, user_id: UserId) -> ApplicationResult<Option<(String, TokenPair)>> {
        let Some(raw) = self.store.get(&key(user_id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<TokenPair>(&raw) {
            Ok(pair) => Ok(Some((raw, pair))),
            Err(err) => {
                tracing::error!(user_id = %user_id, error = %err, "unreadable stored token pair");
                Ok(None)
            }
        }
    }
}

fn refresh_error(err: TokenVerifyError) -> AuthError {
    match err {
        TokenVerifyError::Expired => AuthError::RefreshTokenExpired,
        TokenVerifyError::Invalid(_) => AuthError::InvalidRefreshToken,
    }
}

fn encode_pair(pair: &TokenPair) -> ApplicationResult<String> {
    serde_json::to_string(pair).map_err(|err| ApplicationError::infrastructure(err.to_string()))
}

fn pair_ttl() -> Duration {
    Duration::from_secs(REFRESH_TOKEN_TTL_SECS)
}

fn key(user_id: UserId) -> String {
    format!("{KEY_PREFIX}{user_id}")
}
