// src/presentation/http/session.rs
use crate::application::services::{secrets::constant_time_eq, sessions::SESSION_TTL_SECS};
use axum::http::HeaderValue;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "sso_sess";

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks the session cookie. The cookie value is
/// `<session id>.<base64url HMAC-SHA256 of the id>`.
#[derive(Clone)]
pub struct SessionCookies {
    secret: Arc<[u8]>,
    secure: bool,
}

impl SessionCookies {
    pub fn new(secret: &str, secure: bool) -> Self {
        Self {
            secret: Arc::from(secret.as_bytes()),
            secure,
        }
    }

    fn signature(&self, session_id: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(session_id.as_bytes());
        Some(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    pub fn sign(&self, session_id: &str) -> Option<String> {
        self.signature(session_id)
            .map(|sig| format!("{session_id}.{sig}"))
    }

    /// The session id, if the cookie value carries a valid signature.
    pub fn verify(&self, value: &str) -> Option<String> {
        let (session_id, signature) = value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let expected = self.signature(session_id)?;
        constant_time_eq(&expected, signature).then(|| session_id.to_string())
    }

    pub fn set_cookie(&self, session_id: &str) -> Option<HeaderValue> {
        let value = self.sign(session_id)?;
        self.header(&value, SESSION_TTL_SECS)
    }

    pub fn clear_cookie(&self) -> Option<HeaderValue> {
        self.header("", 0)
    }

    fn header(&self, value: &str, max_age: u64) -> Option<HeaderValue> {
        let secure = if self.secure { "; Secure" } else { "" };
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}"
        ))
        .ok()
    }
}
