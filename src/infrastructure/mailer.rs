// src/infrastructure/mailer.rs
use crate::application::{ApplicationResult, ports::mailer::VerificationMailer};
use crate::domain::{user::Email, verification::VerificationPurpose};
use async_trait::async_trait;

/// Stand-in for a real mail transport. Outside production the code itself is
/// logged so local sign-in works without a mail server.
#[derive(Debug, Clone, Copy)]
pub struct LoggingMailer {
    reveal_codes: bool,
}

impl LoggingMailer {
    pub fn new(reveal_codes: bool) -> Self {
        Self { reveal_codes }
    }
}

#[async_trait]
impl VerificationMailer for LoggingMailer {
    async fn send_code(
        &self,
        email: &Email,
        purpose: VerificationPurpose,
        code: &str,
    ) -> ApplicationResult<()> {
        if self.reveal_codes {
            tracing::info!(email = %email, purpose = %purpose, code, "verification code (not delivered)");
        } else {
            tracing::info!(email = %email, purpose = %purpose, "verification code queued for delivery");
        }
        Ok(())
    }
}
