// src/infrastructure/security/mod.rs
pub mod jwt;
pub mod password;

pub use jwt::JwtTokenSigner;
pub use password::Argon2PasswordHasher;
