// tests/support/mocks/security.rs
use async_trait::async_trait;
use pkce_sso::application::{ApplicationResult, ports::security::PasswordHasher};
use pkce_sso::domain::errors::AuthError;

/// Argon2 を回さずに済む決定論的なハッシャー
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainPasswordHasher;

pub fn plain_hash(password: &str) -> String {
    format!("plain:{password}")
}

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, password: &str) -> ApplicationResult<String> {
        Ok(plain_hash(password))
    }

    async fn verify(&self, password: &str, expected_hash: &str) -> ApplicationResult<()> {
        if plain_hash(password) == expected_hash {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }
}
