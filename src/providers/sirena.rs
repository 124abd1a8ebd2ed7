use url::Url;

use crate::{OAuthError, OAuthProvider};

const PROVIDER_ID: &str = "sirena";

/// The Sirena authorization server. Its endpoints are deployment specific, so
/// they are supplied at construction instead of being compiled in.
#[derive(Debug, Clone)]
pub struct SirenaProvider {
    authorize_url: String,
    token_url: String,
}

impl SirenaProvider {
    pub fn new(
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Result<Self, OAuthError> {
        let authorize_url = authorize_url.into();
        let token_url = token_url.into();
        Url::parse(&authorize_url)?;
        Url::parse(&token_url)?;
        Ok(Self {
            authorize_url,
            token_url,
        })
    }
}

impl OAuthProvider for SirenaProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[cfg(test)]
mod tests {
    use super::SirenaProvider;
    use crate::{OAuthError, OAuthProvider};

    #[test]
    fn keeps_configured_endpoints() {
        let provider = SirenaProvider::new(
            "https://accounts.example.com/oauth2/authorize",
            "https://accounts.example.com/oauth2/token",
        )
        .unwrap();
        assert_eq!(provider.id(), "sirena");
        assert_eq!(
            provider.token_url(),
            "https://accounts.example.com/oauth2/token"
        );
        assert_eq!(provider.default_scope(), "");
    }

    #[test]
    fn rejects_relative_endpoints() {
        let result = SirenaProvider::new("/oauth2/authorize", "/oauth2/token");
        assert!(matches!(result, Err(OAuthError::Url(_))));
    }
}
