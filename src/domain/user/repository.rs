// src/domain/user/repository.rs
use super::entity::{NewUser, User};
use super::value_objects::{Email, UserId};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Persistence for accounts. Lookups return `Ok(None)` for unknown users;
/// `insert` fails with `DomainError::Conflict` when the email is taken.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &Email) -> DomainResult<Option<User>>;
    async fn insert(&self, new_user: NewUser) -> DomainResult<User>;
}
