//! Single sign-on authorization server core.
//!
//! A central login (verification codes or passwords) opens a cookie session;
//! client applications obtain PKCE-bound authorization codes from it and
//! exchange them for rotating access/refresh token pairs.
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
