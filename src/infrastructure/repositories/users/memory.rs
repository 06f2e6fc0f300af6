// src/infrastructure/repositories/users/memory.rs
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::user::{Email, NewUser, User, UserDirectory, UserId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Users {
    next_id: i64,
    by_id: BTreeMap<i64, User>,
}

/// Directory held in memory, used when no database is configured.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Users>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing account, keeping its id.
    pub async fn with_user(self, user: User) -> Self {
        {
            let mut users = self.users.write().await;
            let id = i64::from(user.id);
            users.next_id = users.next_id.max(id);
            users.by_id.insert(id, user);
        }
        self
    }

    pub async fn remove(&self, id: UserId) -> Option<User> {
        self.users.write().await.by_id.remove(&i64::from(id))
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.users.read().await.by_id.get(&i64::from(id)).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .by_id
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> DomainResult<User> {
        let mut users = self.users.write().await;
        if users.by_id.values().any(|user| user.email == new_user.email) {
            return Err(DomainError::Conflict("email already registered".into()));
        }

        users.next_id += 1;
        let id = users.next_id;
        let user = User {
            id: UserId::new(id)?,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: new_user.created_at,
        };
        users.by_id.insert(id, user.clone());
        Ok(user)
    }
}
