//! OAuth 2.0 strategy for the Sirena authorization server.
//!
//! [`SirenaStrategy`] runs the authorization-code flow through a generic
//! [`OAuthClient`], fetches the user profile with the obtained access token and
//! passes both to an application-supplied verify callback. Profile failures
//! surface as a typed [`ProfileError`].

mod client;
mod error;
#[cfg(feature = "local-server")]
mod local_server;
mod pkce;
mod profile;
mod provider;
mod providers;
mod strategy;
mod types;

pub use client::{OAuthClient, OAuthClientConfig};
pub use error::{OAuthError, ProfileError, ProfileErrorKind};
#[cfg(feature = "local-server")]
pub use local_server::{LocalServer, LocalServerConfig};
pub use pkce::PkcePair;
pub use profile::{ErrorPayload, HttpProfileFetcher, Profile, ProfileFetcher};
pub use provider::OAuthProvider;
pub use providers::SirenaProvider;
pub use strategy::{AuthOutcome, STRATEGY_NAME, SirenaOptions, SirenaStrategy};
pub use types::{
    AuthorizationRequest, AuthorizationResponse, ResourceResponse, TokenPlacement, TokenResponse,
};
