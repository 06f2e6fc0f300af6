// src/application/ports/mod.rs
pub mod kv_store;
pub mod mailer;
pub mod security;
pub mod time;
