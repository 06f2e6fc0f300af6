// src/infrastructure/mod.rs
pub mod database;
pub mod mailer;
pub mod repositories;
pub mod security;
pub mod store;
pub mod time;
