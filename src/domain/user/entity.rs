// src/domain/user/entity.rs
use super::value_objects::{DisplayName, Email, PasswordHash, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: DisplayName,
    pub password_hash: Option<PasswordHash>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: DisplayName,
    pub password_hash: Option<PasswordHash>,
    pub created_at: DateTime<Utc>,
}

/// The subset of a user carried inside access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub name: DisplayName,
}
