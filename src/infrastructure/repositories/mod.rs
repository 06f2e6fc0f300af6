// src/infrastructure/repositories/mod.rs
mod error;
pub mod users;

pub use error::map_sqlx;
pub use users::{InMemoryUserDirectory, PostgresUserDirectory};
