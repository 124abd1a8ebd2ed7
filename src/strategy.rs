use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::{
    AuthorizationRequest, AuthorizationResponse, HttpProfileFetcher, OAuthClient,
    OAuthClientConfig, OAuthError, Profile, ProfileFetcher, SirenaProvider, TokenResponse,
};

pub const STRATEGY_NAME: &str = "sirena";

/// Everything a Sirena strategy needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct SirenaOptions {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    pub callback_url: String,
    pub user_profile_url: String,
    pub scope: Option<String>,
    pub pkce: bool,
    pub timeout: Option<Duration>,
}

impl SirenaOptions {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        callback_url: impl Into<String>,
        user_profile_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            callback_url: callback_url.into(),
            user_profile_url: user_profile_url.into(),
            scope: None,
            pkce: false,
            timeout: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_pkce(mut self, pkce: bool) -> Self {
        self.pkce = pkce;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), OAuthError> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("authorization_url", &self.authorization_url),
            ("token_url", &self.token_url),
            ("callback_url", &self.callback_url),
            ("user_profile_url", &self.user_profile_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(OAuthError::InvalidConfig(format!("{name} is required")));
            }
        }
        Url::parse(&self.callback_url)?;
        Ok(())
    }

    fn client_config(&self) -> OAuthClientConfig {
        let mut config = OAuthClientConfig::new(&self.client_id, &self.callback_url)
            .with_client_secret(&self.client_secret)
            .with_pkce(self.pkce);
        if let Some(scope) = &self.scope {
            config = config.with_scope(scope);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

/// Result of a completed authentication attempt.
#[derive(Debug)]
pub enum AuthOutcome<U> {
    Success { user: U, tokens: TokenResponse },
    /// The verify callback did not accept the profile.
    Failure,
}

/// Authenticates users against Sirena: the generic code flow from
/// [`OAuthClient`] followed by a profile fetch through `F`.
#[derive(Debug, Clone)]
pub struct SirenaStrategy<F = HttpProfileFetcher> {
    client: OAuthClient<SirenaProvider>,
    fetcher: F,
}

impl SirenaStrategy<HttpProfileFetcher> {
    pub fn new(options: SirenaOptions) -> Result<Self, OAuthError> {
        options.validate()?;
        let provider = SirenaProvider::new(&options.authorization_url, &options.token_url)?;
        let client = OAuthClient::new(provider, options.client_config())?;
        let fetcher = HttpProfileFetcher::new(client.http().clone(), &options.user_profile_url)?;
        Ok(Self { client, fetcher })
    }
}

impl<F: ProfileFetcher> SirenaStrategy<F> {
    pub fn with_fetcher(client: OAuthClient<SirenaProvider>, fetcher: F) -> Self {
        Self { client, fetcher }
    }

    pub fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    pub fn client(&self) -> &OAuthClient<SirenaProvider> {
        &self.client
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn authorization_request(&self) -> Result<AuthorizationRequest, OAuthError> {
        self.client.authorization_url()
    }

    pub async fn user_profile(&self, access_token: &str) -> Result<Profile, OAuthError> {
        Ok(self.fetcher.fetch_profile(access_token).await?)
    }

    /// Exchanges the code, fetches the profile and hands
    /// `(access_token, refresh_token, profile)` to `verify`.
    ///
    /// `verify` runs at most once, and only with a successfully fetched
    /// profile. It returns `Ok(None)` to reject the user.
    pub async fn authenticate<V, Fut, U>(
        &self,
        response: AuthorizationResponse,
        code_verifier: Option<&str>,
        expected_state: Option<&str>,
        verify: V,
    ) -> Result<AuthOutcome<U>, OAuthError>
    where
        V: FnOnce(String, Option<String>, Profile) -> Fut,
        Fut: Future<Output = Result<Option<U>, OAuthError>>,
    {
        let tokens = self
            .client
            .exchange_code(response, code_verifier, expected_state)
            .await?;
        let profile = self.fetcher.fetch_profile(&tokens.access_token).await?;

        match verify(tokens.access_token.clone(), tokens.refresh_token.clone(), profile).await? {
            Some(user) => {
                info!(strategy = STRATEGY_NAME, "user authenticated");
                Ok(AuthOutcome::Success { user, tokens })
            }
            None => {
                debug!(strategy = STRATEGY_NAME, "verify callback rejected user");
                Ok(AuthOutcome::Failure)
            }
        }
    }

    /// [`Self::authenticate`] driven by the raw redirect URL and the request
    /// that started the flow.
    pub async fn authenticate_callback<V, Fut, U>(
        &self,
        callback_url: &str,
        request: &AuthorizationRequest,
        verify: V,
    ) -> Result<AuthOutcome<U>, OAuthError>
    where
        V: FnOnce(String, Option<String>, Profile) -> Fut,
        Fut: Future<Output = Result<Option<U>, OAuthError>>,
    {
        let response = AuthorizationResponse::from_url(callback_url)?;
        self.authenticate(
            response,
            request.code_verifier(),
            Some(&request.state),
            verify,
        )
        .await
    }
}
