// src/application/services/mod.rs
pub mod accounts;
pub mod authorization_codes;
pub mod authorization_flow;
pub mod pkce;
pub mod rate_limiter;
pub mod secrets;
pub mod sessions;
pub mod token_lifecycle;
pub mod verification_codes;

use std::sync::Arc;

use crate::{
    application::ports::{
        kv_store::ExpiringKvStore,
        mailer::VerificationMailer,
        security::{PasswordHasher, TokenSigner},
        time::Clock,
    },
    config::DeploymentMode,
    domain::user::UserDirectory,
};
use accounts::AccountService;
use authorization_codes::AuthorizationCodeRegistry;
use authorization_flow::AuthorizationFlow;
use rate_limiter::{FailurePolicy, RateLimitConfig, RateLimiter};
use sessions::SessionStore;
use token_lifecycle::TokenLifecycleManager;
use verification_codes::VerificationCodeRegistry;

/// Knobs the services need from configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub mode: DeploymentMode,
    pub redirect_whitelist: Vec<String>,
    pub ip_limit: RateLimitConfig,
    pub email_limit: RateLimitConfig,
    pub failure_policy: FailurePolicy,
}

/// Infrastructure handed to [`ApplicationServices::new`].
pub struct ServicePorts {
    pub store: Arc<dyn ExpiringKvStore>,
    pub users: Arc<dyn UserDirectory>,
    pub signer: Arc<dyn TokenSigner>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub mailer: Arc<dyn VerificationMailer>,
    pub clock: Arc<dyn Clock>,
}

pub struct ApplicationServices {
    pub flow: Arc<AuthorizationFlow>,
    pub accounts: Arc<AccountService>,
    pub sessions: Arc<SessionStore>,
    pub tokens: Arc<TokenLifecycleManager>,
    pub rate_limiter: Arc<RateLimiter>,
    ip_limit: RateLimitConfig,
}

impl ApplicationServices {
    pub fn new(ports: ServicePorts, settings: ServiceSettings) -> Self {
        let ServicePorts {
            store,
            users,
            signer,
            password_hasher,
            mailer,
            clock,
        } = ports;

        let rate_limiter = Arc::new(RateLimiter::new(
            Arc::clone(&store),
            settings.failure_policy,
        ));
        let verification = Arc::new(VerificationCodeRegistry::new(
            Arc::clone(&store),
            settings.mode,
        ));
        let codes = Arc::new(AuthorizationCodeRegistry::new(
            Arc::clone(&store),
            Arc::clone(&clock),
        ));
        let tokens = Arc::new(TokenLifecycleManager::new(
            Arc::clone(&store),
            signer,
            Arc::clone(&users),
            Arc::clone(&clock),
        ));
        let sessions = Arc::new(SessionStore::new(Arc::clone(&store)));

        let flow = Arc::new(AuthorizationFlow::new(
            codes,
            Arc::clone(&tokens),
            settings.redirect_whitelist,
        ));
        let accounts = Arc::new(AccountService::new(
            users,
            password_hasher,
            mailer,
            clock,
            verification,
            Arc::clone(&sessions),
            Arc::clone(&tokens),
            Arc::clone(&rate_limiter),
            settings.email_limit,
        ));

        Self {
            flow,
            accounts,
            sessions,
            tokens,
            rate_limiter,
            ip_limit: settings.ip_limit,
        }
    }

    pub fn ip_limit(&self) -> &RateLimitConfig {
        &self.ip_limit
    }
}
