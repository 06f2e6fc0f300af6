// src/application/ports/mailer.rs
use crate::application::ApplicationResult;
use crate::domain::{user::Email, verification::VerificationPurpose};
use async_trait::async_trait;

/// Outbound delivery of verification codes.
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_code(
        &self,
        email: &Email,
        purpose: VerificationPurpose,
        code: &str,
    ) -> ApplicationResult<()>;
}
