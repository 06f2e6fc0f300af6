use crate::domain::user::UserId;
use serde::{Deserialize, Serialize};

/// What the session layer knows about the caller. Passed into and returned
/// from flow entry points as a value; nothing mutates it in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFacts {
    pub user_id: Option<UserId>,
}

impl SessionFacts {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
