// tests/support/mocks/users.rs
use super::{security::plain_hash, time::fixed_now};
use pkce_sso::domain::user::{DisplayName, Email, PasswordHash, User, UserId};
use pkce_sso::infrastructure::repositories::InMemoryUserDirectory;

pub const ALICE_ID: i64 = 1;
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const ALICE_PASSWORD: &str = "correct horse battery";
pub const BOB_ID: i64 = 2;
pub const BOB_EMAIL: &str = "bob@example.com";

pub fn user_id(id: i64) -> UserId {
    UserId::new(id).expect("valid user id")
}

/// パスワードあり（Alice）となし（Bob）のユーザー
pub fn sample_user(id: i64, email: &str, name: &str, password: Option<&str>) -> User {
    User {
        id: user_id(id),
        email: Email::new(email).expect("valid email"),
        name: DisplayName::new(name).expect("valid name"),
        password_hash: password.map(|pw| PasswordHash::new(plain_hash(pw)).expect("valid hash")),
        created_at: fixed_now(),
    }
}

pub async fn seeded_directory() -> InMemoryUserDirectory {
    InMemoryUserDirectory::new()
        .with_user(sample_user(ALICE_ID, ALICE_EMAIL, "Alice", Some(ALICE_PASSWORD)))
        .await
        .with_user(sample_user(BOB_ID, BOB_EMAIL, "Bob", None))
        .await
}
