use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::OAuthError;

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub pkce: Option<crate::PkcePair>,
    pub state: String,
    pub scope: String,
}

impl AuthorizationRequest {
    pub fn code_verifier(&self) -> Option<&str> {
        self.pkce.as_ref().map(|pkce| pkce.code_verifier.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: Option<String>,
}

impl AuthorizationResponse {
    pub fn new(code: impl Into<String>, state: Option<String>) -> Self {
        Self {
            code: code.into(),
            state,
        }
    }

    /// Parses the redirect the authorization server sent the user back with.
    /// An `error` parameter takes precedence over `code`.
    pub fn from_url(callback_url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(callback_url)?;
        let mut code = None;
        let mut state = None;
        let mut error = None;
        let mut error_description = None;
        let mut error_uri = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.to_string()),
                "state" => state = Some(value.to_string()),
                "error" => error = Some(value.to_string()),
                "error_description" => error_description = Some(value.to_string()),
                "error_uri" => error_uri = Some(value.to_string()),
                _ => {}
            }
        }

        if let Some(code) = error {
            return Err(OAuthError::Authorization {
                code,
                description: error_description,
                uri: error_uri,
            });
        }

        let code = code
            .filter(|code| !code.is_empty())
            .ok_or(OAuthError::MissingAuthorizationCode)?;
        Ok(Self { code, state })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// RFC 6749 section 5.2 error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OAuthErrorBody {
    pub(crate) error: String,
    pub(crate) error_description: Option<String>,
    pub(crate) error_uri: Option<String>,
}

impl OAuthErrorBody {
    pub(crate) fn into_token_error(self) -> OAuthError {
        OAuthError::Token {
            code: self.error,
            description: self.error_description,
            uri: self.error_uri,
        }
    }
}

/// Where an access token goes on a protected resource request. Chosen per
/// call; there is deliberately no query-string placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPlacement {
    AuthorizationHeader { scheme: String },
}

impl TokenPlacement {
    pub fn bearer() -> Self {
        Self::AuthorizationHeader {
            scheme: "Bearer".to_string(),
        }
    }
}

impl Default for TokenPlacement {
    fn default() -> Self {
        Self::bearer()
    }
}

#[derive(Debug, Clone)]
pub struct ResourceResponse {
    pub status: u16,
    pub body: String,
}

impl ResourceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
