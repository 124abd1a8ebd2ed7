use std::time::Duration;

use clap::Parser;
use sirena_oauth::{
    HttpProfileFetcher, LocalServerConfig, OAuthClient, OAuthClientConfig, OAuthError,
    SirenaOptions, SirenaProvider, SirenaStrategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "sirena-login",
    about = "Sign in with Sirena from the terminal and print the tokens and user profile as JSON."
)]
struct Cli {
    #[arg(long, env = "SIRENA_CLIENT_ID")]
    client_id: String,

    #[arg(long, env = "SIRENA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    #[arg(long, env = "SIRENA_AUTHORIZATION_URL")]
    authorization_url: String,

    #[arg(long, env = "SIRENA_TOKEN_URL")]
    token_url: String,

    #[arg(long, env = "SIRENA_USER_PROFILE_URL")]
    user_profile_url: String,

    /// Loopback redirect registered for this client.
    #[arg(
        long,
        env = "SIRENA_CALLBACK_URL",
        default_value = "http://127.0.0.1:8765/auth/sirena/callback"
    )]
    callback_url: String,

    #[arg(long, env = "SIRENA_SCOPE")]
    scope: Option<String>,

    #[arg(long)]
    pkce: bool,

    /// Seconds to wait for the browser redirect.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), OAuthError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut options = SirenaOptions::new(
        cli.client_id,
        cli.client_secret,
        cli.authorization_url,
        cli.token_url,
        cli.callback_url,
        cli.user_profile_url,
    )
    .with_pkce(cli.pkce);
    if let Some(scope) = cli.scope {
        options = options.with_scope(scope);
    }
    options.validate()?;

    let local_server = LocalServerConfig::from_redirect_uri(&options.callback_url)?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    let mut config = OAuthClientConfig::new(&options.client_id, &options.callback_url)
        .with_client_secret(&options.client_secret)
        .with_pkce(options.pkce)
        .with_local_server_config(local_server);
    if let Some(scope) = &options.scope {
        config = config.with_scope(scope);
    }

    let provider = SirenaProvider::new(&options.authorization_url, &options.token_url)?;
    let client = OAuthClient::new(provider, config)?;
    let fetcher = HttpProfileFetcher::new(client.http().clone(), &options.user_profile_url)?;
    let strategy = SirenaStrategy::with_fetcher(client, fetcher);

    let tokens = strategy
        .client()
        .run_local_flow(|auth| {
            eprintln!("Authorization URL:\n{}", auth.authorization_url);
            if let Err(err) = webbrowser::open(&auth.authorization_url) {
                eprintln!("Failed to open browser automatically: {err}");
            }
            Ok(())
        })
        .await?;
    let profile = strategy.user_profile(&tokens.access_token).await?;

    let output = serde_json::json!({ "tokens": tokens, "profile": profile });
    let output =
        serde_json::to_string_pretty(&output).map_err(|err| OAuthError::InvalidResponse {
            message: err.to_string(),
            body: String::new(),
        })?;

    println!("{output}");
    Ok(())
}
