// src/presentation/http/controllers/mod.rs
pub mod auth;
pub mod oauth;
