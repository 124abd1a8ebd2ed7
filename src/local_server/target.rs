use url::Url;

use crate::OAuthError;

/// Loopback address the redirect URI points at.
#[derive(Debug, Clone)]
pub(super) struct RedirectTarget {
    pub(super) host: String,
    pub(super) port: u16,
    pub(super) path: String,
}

impl RedirectTarget {
    pub(super) fn parse(redirect_uri: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(redirect_uri)?;
        if url.scheme() != "http" {
            return Err(OAuthError::InvalidRedirectUri(format!(
                "{redirect_uri}: local redirect must use http"
            )));
        }

        let host = url.host_str().ok_or_else(|| {
            OAuthError::InvalidRedirectUri(format!("{redirect_uri}: missing host"))
        })?;

        let port = url.port_or_known_default().ok_or_else(|| {
            OAuthError::InvalidRedirectUri(format!("{redirect_uri}: missing port"))
        })?;

        Ok(Self {
            host: host.to_string(),
            port,
            path: url.path().to_string(),
        })
    }

    pub(super) fn redirect_uri(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    /// Rebuilds the full redirect URL from the query string the browser sent.
    pub(super) fn callback_url(&self, query: &str) -> Result<String, OAuthError> {
        let mut url = Url::parse(&self.redirect_uri())?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url.to_string())
    }
}
