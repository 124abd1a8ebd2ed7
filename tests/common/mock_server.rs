use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const PROFILE_PATH: &str = "/oauth2/profile";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";

/// A Sirena authorization server stand-in built on `wiremock`, serving the
/// token and profile endpoints.
pub struct MockSirena {
    server: MockServer,
}

impl MockSirena {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }

    pub fn profile_url(&self) -> String {
        self.url(PROFILE_PATH)
    }

    /// Answers `GET /oauth2/profile` for one bearer token only.
    pub async fn mock_profile(&self, access_token: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .and(header("authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_token(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn requests_to(&self, endpoint: &str) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording enabled")
            .into_iter()
            .filter(|request| request.url.path() == endpoint)
            .collect()
    }

    /// Form parameters of the last token request.
    pub async fn last_token_form(&self) -> Vec<(String, String)> {
        let requests = self.requests_to(TOKEN_PATH).await;
        let last = requests.last().expect("expected a token request");
        url::form_urlencoded::parse(&last.body)
            .into_owned()
            .collect()
    }
}

/// An address nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}{PROFILE_PATH}")
}
