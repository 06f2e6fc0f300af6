// src/application/services/accounts.rs
use super::{
    rate_limiter::{RateLimitConfig, RateLimiter},
    sessions::SessionStore,
    token_lifecycle::TokenLifecycleManager,
    verification_codes::VerificationCodeRegistry,
};
use crate::application::{
    ApplicationResult,
    dto::UserInfoDto,
    error::ApplicationError,
    ports::{mailer::VerificationMailer, security::PasswordHasher, time::Clock},
};
use crate::domain::{
    errors::AuthError,
    user::{DisplayName, Email, NewUser, PasswordHash, User, UserDirectory, UserProfile},
    verification::VerificationPurpose,
};
use std::sync::Arc;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct RegisterCommand {
    pub email: String,
    pub name: String,
    pub password: Option<String>,
    pub verification_code: String,
}

/// Exactly one of `code` and `password` is expected; a code wins when both
/// are present.
pub struct LoginCommand {
    pub email: String,
    pub code: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginResult {
    pub session_id: String,
    pub user: UserProfile,
}

/// Everything around the protocol proper: proving ownership of an email,
/// creating accounts, signing in to the central session and reading the
/// profile behind an access token.
pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    password_hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn VerificationMailer>,
    clock: Arc<dyn Clock>,
    verification: Arc<VerificationCodeRegistry>,
    sessions: Arc<SessionStore>,
    tokens: Arc<TokenLifecycleManager>,
    limiter: Arc<RateLimiter>,
    email_limit: RateLimitConfig,
}

impl AccountService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        password_hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn VerificationMailer>,
        clock: Arc<dyn Clock>,
        verification: Arc<VerificationCodeRegistry>,
        sessions: Arc<SessionStore>,
        tokens: Arc<TokenLifecycleManager>,
        limiter: Arc<RateLimiter>,
        email_limit: RateLimitConfig,
    ) -> Self {
        Self {
            users,
            password_hasher,
            mailer,
            clock,
            verification,
            sessions,
            tokens,
            limiter,
            email_limit,
        }
    }

    /// Issue and deliver a code. Limited per email address before anything
    /// else happens. For `login` and `reset` an unknown address is accepted
    /// silently so the endpoint does not reveal which accounts exist.
    pub async fn send_verification_code(
        &self,
        email: Option<&str>,
        purpose: VerificationPurpose,
    ) -> ApplicationResult<()> {
        let normalized = email.map(|raw| raw.trim().to_lowercase());
        self.limiter
            .enforce(normalized.as_deref(), &self.email_limit)
            .await?;

        let email = Email::new(
            normalized.ok_or_else(|| ApplicationError::validation("email is required"))?,
        )?;
        let existing = self.users.find_by_email(&email).await?;

        match (purpose, existing.is_some()) {
            (VerificationPurpose::Register, true) => {
                return Err(ApplicationError::conflict("email already registered"));
            }
            (VerificationPurpose::Login | VerificationPurpose::Reset, false) => {
                tracing::info!(email = %email, purpose = %purpose, "verification requested for unknown email");
                return Ok(());
            }
            _ => {}
        }

        let code = self.verification.issue(&email, purpose).await?;
        self.mailer.send_code(&email, purpose, &code).await
    }

    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
        purpose: VerificationPurpose,
    ) -> ApplicationResult<bool> {
        let email = Email::new(email)?;
        self.verification.verify(&email, code, purpose).await
    }

    pub async fn register(&self, command: RegisterCommand) -> ApplicationResult<UserProfile> {
        let email = Email::new(command.email)?;
        let name = DisplayName::new(command.name)?;
        if let Some(password) = command.password.as_deref() {
            validate_password(password)?;
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApplicationError::conflict("email already registered"));
        }

        if !self
            .verification
            .verify(&email, &command.verification_code, VerificationPurpose::Register)
            .await?
        {
            return Err(AuthError::InvalidVerificationCode.into());
        }

        let password_hash = match command.password.as_deref() {
            Some(password) => Some(PasswordHash::new(self.password_hasher.hash(password).await?)?),
            None => None,
        };

        let user = self
            .users
            .insert(NewUser {
                email,
                name,
                password_hash,
                created_at: self.clock.now(),
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user.profile())
    }

    /// Authenticate against the central sign-in page and open a session.
    pub async fn login(&self, command: LoginCommand) -> ApplicationResult<LoginResult> {
        let email = Email::new(command.email)?;

        let user = match (command.code.as_deref(), command.password.as_deref()) {
            (Some(code), _) => self.login_with_code(&email, code).await?,
            (None, Some(password)) => self.login_with_password(&email, password).await?,
            (None, None) => {
                return Err(ApplicationError::validation(
                    "either code or password is required",
                ));
            }
        };

        let session_id = self.sessions.create(user.id).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResult {
            session_id,
            user: user.profile(),
        })
    }

    pub async fn logout(&self, session_id: &str) -> ApplicationResult<bool> {
        self.sessions.destroy(session_id).await
    }

    /// Profile behind a bearer access token.
    pub async fn user_info(&self, access_token: &str) -> ApplicationResult<UserInfoDto> {
        let claims = self.tokens.authenticate(access_token)?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApplicationError::not_found("user not found"))?;
        Ok(user.profile().into())
    }

    async fn login_with_code(&self, email: &Email, code: &str) -> ApplicationResult<User> {
        // The code is checked before the lookup so unknown emails cost the same.
        let valid = self
            .verification
            .verify(email, code, VerificationPurpose::Login)
            .await?;
        let user = self.users.find_by_email(email).await?;
        match user {
            Some(user) if valid => Ok(user),
            _ => Err(AuthError::InvalidVerificationCode.into()),
        }
    }

    async fn login_with_password(&self, email: &Email, password: &str) -> ApplicationResult<User> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_ref()
            .ok_or(AuthError::InvalidCredentials)?;

        self.password_hasher
            .verify(password, hash.as_str())
            .await
            .inspect_err(|_| tracing::warn!(email = %email, "password login failed"))?;
        Ok(user)
    }
}

fn validate_password(password: &str) -> ApplicationResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApplicationError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
