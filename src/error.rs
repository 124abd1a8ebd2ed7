use thiserror::Error;

pub(crate) const FETCH_FAILED: &str = "Failed to fetch user profile";
pub(crate) const PARSE_FAILED: &str = "Failed to parse user profile";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("os rng error: {message}")]
    OsRng { message: String },

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid redirect uri: {0}")]
    InvalidRedirectUri(String),

    #[error("invalid header: {name}={value}")]
    InvalidHeader { name: String, value: String },

    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String, body: String },

    #[error("authorization denied: {code}")]
    Authorization {
        code: String,
        description: Option<String>,
        uri: Option<String>,
    },

    #[error("token endpoint error: {code}")]
    Token {
        code: String,
        description: Option<String>,
        uri: Option<String>,
    },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("missing authorization code in callback url")]
    MissingAuthorizationCode,

    #[error("state mismatch (expected={expected}, received={received})")]
    StateMismatch { expected: String, received: String },

    #[cfg(feature = "local-server")]
    #[error("local server timed out after {timeout:?}")]
    LocalServerTimeout { timeout: std::time::Duration },
}

/// Why a profile fetch failed. Exactly one variant is produced per failed
/// fetch; callers branch on it instead of inspecting messages.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The authorization server reported a structured application error,
    /// `{"error": {"message": .., "code": ..}}`.
    #[error("{message}")]
    AuthorizationServerApi {
        message: String,
        code: Option<serde_json::Number>,
    },

    /// The profile endpoint answered with an OAuth-style error,
    /// `{"error": .., "error_description": ..}`.
    #[error("{description}")]
    UserInfo { description: String, code: String },

    /// No recognizable error body: connection failure, or a non-2xx status
    /// whose body matched neither known shape.
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The endpoint answered 2xx but the body is not JSON.
    #[error("{message}")]
    Parse {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileErrorKind {
    AuthorizationServerApi,
    UserInfo,
    Transport,
    Parse,
}

impl ProfileError {
    pub(crate) fn transport(
        status: Option<u16>,
        body: Option<String>,
        source: Option<reqwest::Error>,
    ) -> Self {
        Self::Transport {
            message: FETCH_FAILED.to_string(),
            status,
            body,
            source,
        }
    }

    pub(crate) fn parse(source: serde_json::Error) -> Self {
        Self::Parse {
            message: PARSE_FAILED.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ProfileErrorKind {
        match self {
            Self::AuthorizationServerApi { .. } => ProfileErrorKind::AuthorizationServerApi,
            Self::UserInfo { .. } => ProfileErrorKind::UserInfo,
            Self::Transport { .. } => ProfileErrorKind::Transport,
            Self::Parse { .. } => ProfileErrorKind::Parse,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::AuthorizationServerApi { message, .. } => message,
            Self::UserInfo { description, .. } => description,
            Self::Transport { message, .. } | Self::Parse { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ProfileError, ProfileErrorKind};

    #[test]
    fn transport_error_uses_fixed_message() {
        let error = ProfileError::transport(Some(502), Some("<html>".to_string()), None);
        assert_eq!(error.kind(), ProfileErrorKind::Transport);
        assert_eq!(error.to_string(), "Failed to fetch user profile");
    }

    #[test]
    fn parse_error_keeps_json_source() {
        let source = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error = ProfileError::parse(source);
        assert_eq!(error.message(), "Failed to parse user profile");
        assert!(std::error::Error::source(&error).is_some());
    }
}
