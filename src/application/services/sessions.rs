// src/application/services/sessions.rs
use super::secrets::random_url_token;
use crate::application::{
    ApplicationResult, dto::SessionFacts, error::ApplicationError,
    ports::kv_store::ExpiringKvStore,
};
use crate::domain::user::UserId;
use std::{sync::Arc, time::Duration};

const KEY_PREFIX: &str = "session:";
const SESSION_ID_BYTES: usize = 32;
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24;

/// Login sessions of the central sign-in page. The transport only ever holds
/// the opaque session id; what it stands for lives in the store.
pub struct SessionStore {
    store: Arc<dyn ExpiringKvStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn ExpiringKvStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: UserId) -> ApplicationResult<String> {
        let session_id = random_url_token(SESSION_ID_BYTES);
        let payload = serde_json::to_string(&SessionFacts::authenticated(user_id))
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))?;
        self.store
            .set(&key(&session_id), &payload, Duration::from_secs(SESSION_TTL_SECS))
            .await?;
        tracing::info!(user_id = %user_id, "session created");
        Ok(session_id)
    }

    /// Unknown, expired and unreadable sessions are all anonymous.
    pub async fn load(&self, session_id: &str) -> ApplicationResult<SessionFacts> {
        let Some(raw) = self.store.get(&key(session_id)).await? else {
            return Ok(SessionFacts::anonymous());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable session record");
            SessionFacts::anonymous()
        }))
    }

    pub async fn destroy(&self, session_id: &str) -> ApplicationResult<bool> {
        let removed = self.store.del(&key(session_id)).await?;
        if removed {
            tracing::info!("session destroyed");
        }
        Ok(removed)
    }
}

fn key(session_id: &str) -> String {
    format!("{KEY_PREFIX}{session_id}")
}
