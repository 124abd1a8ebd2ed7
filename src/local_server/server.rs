use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Router, routing::get};
use tokio::net::TcpListener as TokioTcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::{AuthorizationResponse, OAuthError};

use super::config::{DEFAULT_ERROR_HTML, DEFAULT_SUCCESS_HTML, LocalServerConfig};
use super::http::{CallbackState, callback_handler, deliver, fallback_handler, wait_for_callback};
use super::target::RedirectTarget;

#[derive(Debug, Clone)]
pub struct LocalServer {
    target: RedirectTarget,
    success_html: String,
    error_html: String,
    timeout: Option<Duration>,
}

impl LocalServer {
    pub fn new(redirect_uri: impl Into<String>) -> Result<Self, OAuthError> {
        let redirect_uri = redirect_uri.into();
        Ok(Self {
            target: RedirectTarget::parse(&redirect_uri)?,
            success_html: DEFAULT_SUCCESS_HTML.to_string(),
            error_html: DEFAULT_ERROR_HTML.to_string(),
            timeout: None,
        })
    }

    pub fn from_config(config: LocalServerConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            target: RedirectTarget::parse(&config.redirect_uri())?,
            success_html: config.success_html,
            error_html: config.error_html,
            timeout: config.timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn redirect_uri(&self) -> String {
        self.target.redirect_uri()
    }

    pub fn bind(&self) -> Result<TcpListener, OAuthError> {
        TcpListener::bind((self.target.host.as_str(), self.target.port)).map_err(OAuthError::from)
    }

    /// Serves on `listener` until the first redirect carrying a code or an
    /// error arrives, then shuts down.
    pub async fn listen_with_async(
        &self,
        listener: TcpListener,
    ) -> Result<AuthorizationResponse, OAuthError> {
        let (callback_tx, callback_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let callback_tx = Arc::new(Mutex::new(Some(callback_tx)));

        let state = CallbackState {
            target: self.target.clone(),
            success_html: self.success_html.clone(),
            error_html: self.error_html.clone(),
            callback_tx: callback_tx.clone(),
        };

        let app = Router::new()
            .route(&state.target.path, get(callback_handler))
            .fallback(fallback_handler)
            .with_state(state);

        listener.set_nonblocking(true)?;
        let listener = TokioTcpListener::from_std(listener)?;
        info!(redirect_uri = %self.target.redirect_uri(), "waiting for authorization redirect");

        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });

        let server_handle = tokio::spawn(async move {
            if let Err(err) = server.await {
                let error = OAuthError::InvalidResponse {
                    message: err.to_string(),
                    body: String::new(),
                };
                deliver(&callback_tx, Err(error));
            }
        });

        let result = wait_for_callback(callback_rx, self.timeout).await;

        let _ = shutdown_tx.send(());
        let _ = server_handle.await;
        debug!("local server stopped");

        result
    }
}
