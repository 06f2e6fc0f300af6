// src/presentation/http/state.rs
use super::session::SessionCookies;
use crate::application::services::ApplicationServices;
use std::sync::Arc;

#[derive(Clone)]
pub struct HttpState {
    pub services: Arc<ApplicationServices>,
    pub cookies: SessionCookies,
    pub allowed_origins: Arc<[String]>,
}
