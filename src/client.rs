use std::collections::HashMap;
use std::time::Duration;

use reqwest::{
    Client, RequestBuilder,
    header::{AUTHORIZATION, HeaderName, HeaderValue},
};
use tracing::debug;
use url::Url;

use crate::pkce::generate_state;
use crate::types::OAuthErrorBody;
use crate::{
    AuthorizationRequest, AuthorizationResponse, OAuthError, OAuthProvider, PkcePair,
    ResourceResponse, TokenPlacement, TokenResponse,
};
#[cfg(feature = "local-server")]
use crate::{LocalServer, LocalServerConfig};

#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: Option<String>,
    pub pkce: bool,
    pub authorize_params: Vec<(String, String)>,
    pub token_params: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    #[cfg(feature = "local-server")]
    pub local_server: Option<LocalServerConfig>,
}

impl OAuthClientConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            scope: None,
            pkce: false,
            authorize_params: Vec::new(),
            token_params: Vec::new(),
            timeout: None,
            #[cfg(feature = "local-server")]
            local_server: None,
        }
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
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

    #[cfg(feature = "local-server")]
    pub fn with_local_server_config(mut self, local_server: LocalServerConfig) -> Self {
        self.redirect_uri = local_server.redirect_uri();
        self.local_server = Some(local_server);
        self
    }

    pub fn with_authorize_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.authorize_params.push((key.into(), value.into()));
        self
    }

    pub fn with_token_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.token_params.push((key.into(), value.into()));
        self
    }
}

/// Provider-agnostic authorization-code flow: builds the authorize URL,
/// exchanges and refreshes tokens, and reads protected resources.
#[derive(Debug, Clone)]
pub struct OAuthClient<P: OAuthProvider> {
    provider: P,
    config: OAuthClientConfig,
    http: Client,
}

impl<P: OAuthProvider> OAuthClient<P> {
    pub fn new(provider: P, config: OAuthClientConfig) -> Result<Self, OAuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            provider,
            config,
            http,
        })
    }

    pub fn with_http_client(provider: P, config: OAuthClientConfig, http: Client) -> Self {
        Self {
            provider,
            config,
            http,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn authorization_url(&self) -> Result<AuthorizationRequest, OAuthError> {
        self.authorization_url_with_state(None)
    }

    pub fn authorization_url_with_state(
        &self,
        state: Option<String>,
    ) -> Result<AuthorizationRequest, OAuthError> {
        let pkce = if self.config.pkce {
            Some(PkcePair::generate()?)
        } else {
            None
        };
        let state = match state {
            Some(state) => state,
            None => generate_state()?,
        };
        let scope = self
            .config
            .scope
            .as_deref()
            .unwrap_or(self.provider.default_scope());

        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in self.provider.authorize_params() {
            params.insert(key, value);
        }
        for (key, value) in &self.config.authorize_params {
            params.insert(key.clone(), value.clone());
        }

        params.insert("response_type".to_string(), "code".to_string());
        params.insert("client_id".to_string(), self.config.client_id.clone());
        params.insert("redirect_uri".to_string(), self.config.redirect_uri.clone());
        params.insert("state".to_string(), state.clone());
        if !scope.is_empty() {
            params.insert("scope".to_string(), scope.to_string());
        }
        if let Some(pkce) = &pkce {
            params.insert("code_challenge".to_string(), pkce.code_challenge.clone());
            params.insert("code_challenge_method".to_string(), "S256".to_string());
        }

        let mut url = Url::parse(self.provider.authorize_url())?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(&key, &value);
            }
        }

        Ok(AuthorizationRequest {
            authorization_url: url.to_string(),
            pkce,
            state,
            scope: scope.to_string(),
        })
    }

    #[cfg(feature = "local-server")]
    pub async fn run_local_flow<F>(&self, on_authorize: F) -> Result<TokenResponse, OAuthError>
    where
        F: FnOnce(&AuthorizationRequest) -> Result<(), OAuthError>,
    {
        let auth = self.authorization_url()?;
        let server = match &self.config.local_server {
            Some(config) => LocalServer::from_config(config.clone())?,
            None => LocalServer::new(self.config.redirect_uri.clone())?,
        };
        let listener = server.bind()?;

        let handle = tokio::spawn(async move { server.listen_with_async(listener).await });

        on_authorize(&auth)?;

        let response = handle.await.map_err(|err| OAuthError::InvalidResponse {
            message: err.to_string(),
            body: String::new(),
        })??;

        self.exchange_code(response, auth.code_verifier(), Some(&auth.state))
            .await
    }

    pub async fn exchange_code(
        &self,
        response: AuthorizationResponse,
        code_verifier: Option<&str>,
        expected_state: Option<&str>,
    ) -> Result<TokenResponse, OAuthError> {
        let AuthorizationResponse { code, state } = response;

        if let Some(expected) = expected_state {
            let returned = state.as_deref().unwrap_or_default();
            if expected != returned {
                return Err(OAuthError::StateMismatch {
                    expected: expected.to_string(),
                    received: returned.to_string(),
                });
            }
        }

        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "authorization_code".to_string());
        payload.insert("code".to_string(), code);
        payload.insert("redirect_uri".to_string(), self.config.redirect_uri.clone());

        if let Some(verifier) = code_verifier {
            payload.insert("code_verifier".to_string(), verifier.to_string());
        }

        self.send_token_request(payload).await
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        let mut payload = HashMap::new();
        payload.insert("grant_type".to_string(), "refresh_token".to_string());
        payload.insert("refresh_token".to_string(), refresh_token.to_string());

        self.send_token_request(payload).await
    }

    /// GETs a protected resource with the access token placed as requested.
    pub async fn get_protected_resource(
        &self,
        url: &Url,
        access_token: &str,
        placement: &TokenPlacement,
    ) -> Result<ResourceResponse, reqwest::Error> {
        get_protected_resource(&self.http, url, access_token, placement).await
    }

    async fn send_token_request(
        &self,
        mut payload: HashMap<String, String>,
    ) -> Result<TokenResponse, OAuthError> {
        payload.insert("client_id".to_string(), self.config.client_id.clone());
        if let Some(secret) = &self.config.client_secret {
            payload.insert("client_secret".to_string(), secret.clone());
        }
        for (key, value) in self.provider.token_params() {
            payload.insert(key, value);
        }
        for (key, value) in &self.config.token_params {
            payload.insert(key.clone(), value.clone());
        }

        debug!(
            provider = self.provider.id(),
            grant_type = payload.get("grant_type").map(String::as_str),
            url = self.provider.token_url(),
            "requesting token"
        );

        let headers = self.provider.token_headers();
        let builder = apply_headers(self.http.post(self.provider.token_url()), &headers)?;
        let response = builder.form(&payload).send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "token endpoint responded");

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OAuthErrorBody>(&body) {
                return Err(error.into_token_error());
            }
            return Err(OAuthError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let token = serde_json::from_str(&body).map_err(|err| OAuthError::InvalidResponse {
            message: err.to_string(),
            body,
        })?;

        Ok(token)
    }
}

pub(crate) async fn get_protected_resource(
    http: &Client,
    url: &Url,
    access_token: &str,
    placement: &TokenPlacement,
) -> Result<ResourceResponse, reqwest::Error> {
    let builder = match placement {
        TokenPlacement::AuthorizationHeader { scheme } => http
            .get(url.clone())
            .header(AUTHORIZATION, format!("{scheme} {access_token}")),
    };

    debug!(url = %url, "requesting protected resource");
    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    debug!(url = %url, status, "protected resource responded");

    Ok(ResourceResponse { status, body })
}

fn apply_headers(
    mut builder: RequestBuilder,
    headers: &[(String, String)],
) -> Result<RequestBuilder, OAuthError> {
    for (name, value) in headers {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| OAuthError::InvalidHeader {
                name: name.clone(),
                value: value.clone(),
            })?;
        let value = HeaderValue::from_str(value).map_err(|_| OAuthError::InvalidHeader {
            name: name.to_string(),
            value: value.clone(),
        })?;
        builder = builder.header(name, value);
    }
    Ok(builder)
}
