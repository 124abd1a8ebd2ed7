/// Endpoints and request decorations of one authorization server.
///
/// The base flow in [`crate::OAuthClient`] is provider-agnostic; everything
/// that differs between servers goes through this trait.
pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &str;
    fn authorize_url(&self) -> &str;
    fn token_url(&self) -> &str;

    fn default_scope(&self) -> &str {
        ""
    }

    fn authorize_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn token_params(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn token_headers(&self) -> Vec<(String, String)> {
        vec![("Accept".to_string(), "application/json".to_string())]
    }
}
