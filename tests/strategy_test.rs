mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::mock_server::{AUTHORIZE_PATH, MockSirena, TOKEN_PATH};
use serde_json::json;
use sirena_oauth::{
    AuthOutcome, AuthorizationResponse, OAuthError, Profile, ProfileError, SirenaOptions,
    SirenaStrategy,
};
use wiremock::ResponseTemplate;

const CALLBACK_URL: &str = "https://www.appname.net/auth/sirena/callback";

fn strategy(server: &MockSirena) -> SirenaStrategy {
    let options = SirenaOptions::new(
        "dashboard",
        "shhh-its-a-secret",
        server.url(AUTHORIZE_PATH),
        server.url(TOKEN_PATH),
        CALLBACK_URL,
        server.profile_url(),
    );
    SirenaStrategy::new(options).unwrap()
}

fn token_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "refresh_token": "refresh-1",
        "token_type": "Bearer",
        "expires_in": 3600,
    })
}

#[tokio::test]
async fn authenticate_passes_tokens_and_profile_to_verify() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .await;
    server
        .mock_profile(
            "access-1",
            ResponseTemplate::new(200).set_body_json(json!({"id": "u-7", "name": "Ada"})),
        )
        .await;

    let strategy = strategy(&server);
    let calls = AtomicUsize::new(0);
    let outcome = strategy
        .authenticate(
            AuthorizationResponse::new("code-1", Some("state-1".to_string())),
            None,
            Some("state-1"),
            |access_token, refresh_token, profile: Profile| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert_eq!(access_token, "access-1");
                    assert_eq!(refresh_token.as_deref(), Some("refresh-1"));
                    let id = profile.get("id").and_then(|id| id.as_str()).map(str::to_string);
                    Ok(id)
                }
            },
        )
        .await
        .expect("authentication");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match outcome {
        AuthOutcome::Success { user, tokens } => {
            assert_eq!(user, "u-7");
            assert_eq!(tokens.expires_in, Some(3600));
        }
        AuthOutcome::Failure => panic!("expected success"),
    }

    let form = server.last_token_form().await;
    for expected in [
        ("grant_type", "authorization_code"),
        ("code", "code-1"),
        ("client_id", "dashboard"),
        ("client_secret", "shhh-its-a-secret"),
        ("redirect_uri", CALLBACK_URL),
    ] {
        assert!(
            form.iter().any(|(k, v)| k == expected.0 && v == expected.1),
            "missing {}={} in {form:?}",
            expected.0,
            expected.1
        );
    }
    assert!(!form.iter().any(|(k, _)| k == "code_verifier"));
}

#[tokio::test]
async fn verify_rejection_is_failure_outcome() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .await;
    server
        .mock_profile("access-1", ResponseTemplate::new(200).set_body_json(json!({"id": "u-7"})))
        .await;

    let outcome = strategy(&server)
        .authenticate(
            AuthorizationResponse::new("code-1", None),
            None,
            None,
            |_, _, _| async { Ok::<Option<String>, OAuthError>(None) },
        )
        .await
        .expect("authentication");

    assert!(matches!(outcome, AuthOutcome::Failure));
}

#[tokio::test]
async fn profile_error_fails_without_calling_verify() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .await;
    server
        .mock_profile(
            "access-1",
            ResponseTemplate::new(403)
                .set_body_json(json!({"error": {"message": "account suspended", "code": 13}})),
        )
        .await;

    let calls = AtomicUsize::new(0);
    let err = strategy(&server)
        .authenticate(
            AuthorizationResponse::new("code-1", None),
            None,
            None,
            |_, _, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Some(())) }
            },
        )
        .await
        .expect_err("should fail");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    match err {
        OAuthError::Profile(ProfileError::AuthorizationServerApi { message, code }) => {
            assert_eq!(message, "account suspended");
            assert_eq!(code.and_then(|code| code.as_i64()), Some(13));
        }
        other => panic!("Expected profile error, got: {other:?}"),
    }
}

#[tokio::test]
async fn token_endpoint_error_is_typed() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The code has expired.",
        })))
        .await;

    let err = strategy(&server)
        .authenticate(
            AuthorizationResponse::new("stale", None),
            None,
            None,
            |_, _, _| async { Ok(Some(())) },
        )
        .await
        .expect_err("should fail");

    match err {
        OAuthError::Token {
            code, description, ..
        } => {
            assert_eq!(code, "invalid_grant");
            assert_eq!(description.as_deref(), Some("The code has expired."));
        }
        other => panic!("Expected Token, got: {other:?}"),
    }
    assert!(server.requests_to(common::mock_server::PROFILE_PATH).await.is_empty());
}

#[tokio::test]
async fn token_endpoint_failure_without_error_body() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(503).set_body_string("maintenance"))
        .await;

    let err = strategy(&server)
        .client()
        .refresh_token("refresh-1")
        .await
        .expect_err("should fail");

    assert!(matches!(err, OAuthError::HttpStatus { status: 503, .. }));
    let form = server.last_token_form().await;
    assert!(form.contains(&("grant_type".to_string(), "refresh_token".to_string())));
    assert!(form.contains(&("refresh_token".to_string(), "refresh-1".to_string())));
}

#[tokio::test]
async fn authenticate_callback_checks_state_and_sends_verifier() {
    let server = MockSirena::start().await;
    server
        .mock_token(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .await;
    server
        .mock_profile("access-1", ResponseTemplate::new(200).set_body_json(json!({"id": "u-7"})))
        .await;

    let options = SirenaOptions::new(
        "dashboard",
        "shhh-its-a-secret",
        server.url(AUTHORIZE_PATH),
        server.url(TOKEN_PATH),
        CALLBACK_URL,
        server.profile_url(),
    )
    .with_pkce(true);
    let strategy = SirenaStrategy::new(options).unwrap();
    let request = strategy.authorization_request().unwrap();

    let forged = format!("{CALLBACK_URL}?code=code-1&state=forged");
    let err = strategy
        .authenticate_callback(&forged, &request, |_, _, _| async { Ok(Some(())) })
        .await
        .expect_err("state mismatch");
    assert!(matches!(err, OAuthError::StateMismatch { .. }));

    let callback = format!("{CALLBACK_URL}?code=code-1&state={}", request.state);
    let outcome = strategy
        .authenticate_callback(&callback, &request, |_, _, _| async { Ok(Some(())) })
        .await
        .expect("authentication");
    assert!(matches!(outcome, AuthOutcome::Success { .. }));

    let form = server.last_token_form().await;
    let verifier = request.code_verifier().unwrap().to_string();
    assert!(form.contains(&("code_verifier".to_string(), verifier)));
}

#[tokio::test]
async fn denied_callback_never_reaches_token_endpoint() {
    let server = MockSirena::start().await;
    let strategy = strategy(&server);
    let request = strategy.authorization_request().unwrap();

    let callback = format!("{CALLBACK_URL}?error=access_denied&state={}", request.state);
    let err = strategy
        .authenticate_callback(&callback, &request, |_, _, _| async { Ok(Some(())) })
        .await
        .expect_err("denied");

    assert!(matches!(err, OAuthError::Authorization { code, .. } if code == "access_denied"));
    assert!(server.requests_to(TOKEN_PATH).await.is_empty());
}
