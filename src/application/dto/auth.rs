use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::token::TokenPair;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeRequest {
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

/// Redirect instruction returned as data; the transport decides whether to
/// answer with it or to issue an HTTP redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorizationRedirect {
    pub code: String,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthorizationRedirect {
    /// `redirect_uri` with `code` (and `state`) appended as query parameters.
    pub fn location(&self) -> ApplicationResult<String> {
        let mut params = vec![("code", self.code.as_str())];
        if let Some(state) = self.state.as_deref() {
            params.push(("state", state));
        }
        let query = serde_urlencoded::to_string(&params)
            .map_err(|err| ApplicationError::infrastructure(err.to_string()))?;
        let separator = if self.redirect_uri.contains('?') { '&' } else { '?' };
        Ok(format!("{}{separator}{query}", self.redirect_uri))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    CodeIssued(AuthorizationRedirect),
    NeedLogin,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

impl TokenResponse {
    /// `expires_in` is what the access token has left, not its full TTL; a
    /// reused stored pair may be part way through its lifetime.
    pub fn new(pair: TokenPair, expires_in: u64) -> Self {
        Self {
            access_token: pair.access_token,
            token_type: "Bearer".into(),
            refresh_token: pair.refresh_token,
            expires_in,
        }
    }
}
