//! User profile retrieval.
//!
//! A fetch issues one GET against the profile endpoint and resolves to either
//! the parsed body or a [`ProfileError`]. Error bodies are matched against the
//! shapes the authorization server is known to return, in order; anything
//! else is reported as a transport failure rather than guessed at.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use url::Url;

use crate::client::get_protected_resource;
use crate::{OAuthError, ProfileError, TokenPlacement};

/// The profile endpoint's JSON body, exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Value);

impl Profile {
    pub fn new(json: Value) -> Self {
        Self(json)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Profile> for Value {
    fn from(profile: Profile) -> Self {
        profile.0
    }
}

/// Recognized error bodies of a failed profile request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// `{"error": {"message": "...", "code": 42}}`
    ApplicationError {
        message: String,
        code: Option<Number>,
    },
    /// `{"error": "invalid_request", "error_description": "..."}`. A numeric
    /// `error` is kept in its decimal form.
    UserInfo { description: String, code: String },
}

// Variant order is match order.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Application {
        error: ApplicationBody,
    },
    UserInfo {
        error: Value,
        error_description: String,
    },
}

#[derive(Deserialize)]
struct ApplicationBody {
    message: String,
    // Any JSON type is accepted so a malformed code never hides the message.
    #[serde(default)]
    code: Option<Value>,
}

impl ErrorPayload {
    /// Returns `None` for non-JSON bodies and for JSON matching neither shape.
    pub fn classify(body: &str) -> Option<Self> {
        match serde_json::from_str::<RawPayload>(body).ok()? {
            RawPayload::Application { error } if !error.message.is_empty() => {
                Some(Self::ApplicationError {
                    message: error.message,
                    code: match error.code {
                        Some(Value::Number(code)) => Some(code),
                        _ => None,
                    },
                })
            }
            RawPayload::UserInfo {
                error,
                error_description,
            } if !error_description.is_empty() => {
                let code = match error {
                    Value::String(code) if !code.is_empty() => code,
                    Value::Number(code) => code.to_string(),
                    _ => return None,
                };
                Some(Self::UserInfo {
                    description: error_description,
                    code,
                })
            }
            _ => None,
        }
    }

    pub fn into_error(self) -> ProfileError {
        match self {
            Self::ApplicationError { message, code } => {
                ProfileError::AuthorizationServerApi { message, code }
            }
            Self::UserInfo { description, code } => ProfileError::UserInfo { description, code },
        }
    }
}

/// Policy for turning an access token into a user profile.
pub trait ProfileFetcher: Send + Sync {
    fn fetch_profile(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<Profile, ProfileError>> + Send;
}

/// Fetches the profile over HTTP, presenting the token as a bearer credential.
#[derive(Debug, Clone)]
pub struct HttpProfileFetcher {
    http: Client,
    profile_url: Url,
    placement: TokenPlacement,
}

impl HttpProfileFetcher {
    pub fn new(http: Client, profile_url: &str) -> Result<Self, OAuthError> {
        Ok(Self {
            http,
            profile_url: Url::parse(profile_url)?,
            placement: TokenPlacement::bearer(),
        })
    }

    pub fn with_placement(mut self, placement: TokenPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn profile_url(&self) -> &Url {
        &self.profile_url
    }
}

impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProfileError> {
        let response =
            get_protected_resource(&self.http, &self.profile_url, access_token, &self.placement)
                .await
                .map_err(|err| {
                    let status = err.status().map(|status| status.as_u16());
                    ProfileError::transport(status, None, Some(err))
                })?;

        if !response.is_success() {
            return Err(match ErrorPayload::classify(&response.body) {
                Some(payload) => payload.into_error(),
                None => ProfileError::transport(Some(response.status), Some(response.body), None),
            });
        }

        let json = serde_json::from_str(&response.body).map_err(ProfileError::parse)?;
        Ok(Profile(json))
    }
}
