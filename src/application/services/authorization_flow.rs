// src/application/services/authorization_flow.rs
use super::{
    authorization_codes::AuthorizationCodeRegistry, pkce, token_lifecycle::TokenLifecycleManager,
};
use crate::application::{
    ApplicationResult,
    dto::{AuthorizationRedirect, AuthorizeOutcome, AuthorizeRequest, SessionFacts},
    error::ApplicationError,
};
use crate::domain::{authorization::PkceChallenge, errors::AuthError, token::TokenPair};
use std::sync::Arc;

/// Authorize → Token → Refresh → Revoke, composed from the registries.
///
/// ```text
/// START ─┬─ session ──▶ AUTHORIZED ──▶ CODE_ISSUED ──▶ TOKEN_ISSUED/ACTIVE ⇄ REFRESHED
///        └─ no session ▶ NEED_LOGIN                                          │
///                                                              logout ──▶ REVOKED
/// ```
pub struct AuthorizationFlow {
    codes: Arc<AuthorizationCodeRegistry>,
    tokens: Arc<TokenLifecycleManager>,
    redirect_whitelist: Vec<String>,
}

impl AuthorizationFlow {
    pub fn new(
        codes: Arc<AuthorizationCodeRegistry>,
        tokens: Arc<TokenLifecycleManager>,
        redirect_whitelist: Vec<String>,
    ) -> Self {
        Self {
            codes,
            tokens,
            redirect_whitelist,
        }
    }

    /// START. Request parameters, PKCE included, are validated before the
    /// session is consulted, so a malformed request never reaches login.
    pub async fn authorize(
        &self,
        session: &SessionFacts,
        request: AuthorizeRequest,
    ) -> ApplicationResult<AuthorizeOutcome> {
        let redirect_uri = self.validate_redirect_uri(request.redirect_uri.as_deref())?;
        let challenge = PkceChallenge::parse(
            request.code_challenge.as_deref(),
            request.code_challenge_method.as_deref(),
        )?;

        let Some(user_id) = session.current_user_id() else {
            tracing::info!(redirect_uri = %redirect_uri, "authorization requires login");
            return Ok(AuthorizeOutcome::NeedLogin);
        };

        let code = self.codes.issue_with_challenge(user_id, &challenge).await?;
        Ok(AuthorizeOutcome::CodeIssued(AuthorizationRedirect {
            code,
            redirect_uri,
            state: request.state.filter(|s| !s.is_empty()),
        }))
    }

    /// CODE_ISSUED → TOKEN_ISSUED. A request without a verifier is turned
    /// away before the code is touched; a verifier that does not match burns it.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> ApplicationResult<TokenPair> {
        let Some(code_verifier) = code_verifier.filter(|v| !v.is_empty()) else {
            return Err(AuthError::MissingCodeVerifier.into());
        };

        let grant = self.codes.redeem(code).await?;

        if let Err(err) = pkce::verify(Some(code_verifier), &grant) {
            tracing::warn!(user_id = %grant.user_id, reason = ?err, "PKCE verification failed");
            return Err(err.into());
        }

        if let Some(existing) = self.tokens.redeem_existing(grant.user_id).await? {
            return Ok(existing);
        }
        self.tokens.issue_pair(grant.user_id).await
    }

    /// ACTIVE → REFRESHED. Failures leave stored state untouched.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        access_token: &str,
    ) -> ApplicationResult<TokenPair> {
        self.tokens.refresh(refresh_token, access_token).await
    }

    /// ACTIVE/REFRESHED → REVOKED.
    pub async fn revoke(&self, refresh_token: &str) -> ApplicationResult<bool> {
        self.tokens.revoke(refresh_token).await
    }

    fn validate_redirect_uri(&self, redirect_uri: Option<&str>) -> ApplicationResult<String> {
        let redirect_uri = redirect_uri
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| ApplicationError::validation("missing redirect_uri"))?;

        if !self.redirect_whitelist.iter().any(|allowed| allowed == redirect_uri) {
            tracing::warn!(redirect_uri, "redirect_uri not in whitelist");
            return Err(ApplicationError::validation("invalid redirect_uri"));
        }
        Ok(redirect_uri.to_string())
    }
}
