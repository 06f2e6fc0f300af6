// tests/support/mocks/mailer.rs
use async_trait::async_trait;
use pkce_sso::application::{ApplicationResult, ports::mailer::VerificationMailer};
use pkce_sso::domain::{user::Email, verification::VerificationPurpose};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub email: String,
    pub purpose: VerificationPurpose,
    pub code: String,
}

/// 送信内容を記録するだけのメーラー
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentCode>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentCode> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code_for(&self, email: &str, purpose: VerificationPurpose) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|sent| sent.email == email && sent.purpose == purpose)
            .map(|sent| sent.code.clone())
    }
}

#[async_trait]
impl VerificationMailer for RecordingMailer {
    async fn send_code(
        &self,
        email: &Email,
        purpose: VerificationPurpose,
        code: &str,
    ) -> ApplicationResult<()> {
        self.sent.lock().unwrap().push(SentCode {
            email: email.as_str().to_string(),
            purpose,
            code: code.to_string(),
        });
        Ok(())
    }
}
