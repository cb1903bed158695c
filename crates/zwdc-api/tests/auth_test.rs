#![allow(clippy::unwrap_used)]
// Integration tests for `TokenManager` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zwdc_api::auth::{TOKEN_PATH, TokenState};
use zwdc_api::{AuthConfig, Error, TokenManager};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TokenManager) {
    let server = MockServer::start().await;
    let config = AuthConfig {
        endpoint: Url::parse(&server.uri()).unwrap(),
        client_id: "connector".into(),
        username: "zwave".into(),
        password: SecretString::from("secret".to_string()),
        expiration_buffer: Duration::ZERO,
    };
    let manager = TokenManager::with_client(reqwest::Client::new(), config);
    (server, manager)
}

fn token_body(access: &str, expires_in: u64, refresh_expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": access,
        "expires_in": expires_in,
        "refresh_token": format!("refresh-{access}"),
        "refresh_expires_in": refresh_expires_in,
        "token_type": "Bearer"
    })
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_then_cached() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=zwave"))
        .and(body_string_contains("client_id=connector"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", 300, 1800)))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(manager.state(), TokenState::Unauthenticated);
    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a1");
    assert_eq!(manager.state(), TokenState::AccessValid);

    // Valid token: no second round trip (enforced by `.expect(1)`).
    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a1");
}

#[tokio::test]
async fn test_login_failure_resets_state() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let result = manager.ensure_access().await;
    match result {
        Err(Error::Authentication { message }) => assert!(message.contains("invalid_grant")),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert_eq!(manager.state(), TokenState::Unauthenticated);
}

// ── Refresh ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_access_uses_refresh_token() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", 0, 1800)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", 300, 1800)))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a1");
    assert_eq!(manager.state(), TokenState::AccessExpiredRefreshValid);
    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a2");
    assert_eq!(manager.state(), TokenState::AccessValid);
}

#[tokio::test]
async fn test_rejected_refresh_falls_back_to_login() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", 0, 1800)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("session not active"))
        .expect(1)
        .mount(&server)
        .await;

    manager.ensure_access().await.unwrap();
    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a1");
}

#[tokio::test]
async fn test_fully_expired_token_logs_in_again() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", 0, 0)))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", 300, 1800)))
        .expect(0)
        .mount(&server)
        .await;

    manager.ensure_access().await.unwrap();
    assert_eq!(manager.state(), TokenState::Expired);
    assert_eq!(manager.ensure_access().await.unwrap(), "Bearer a1");
}

#[tokio::test]
async fn test_malformed_token_response() {
    let (server, manager) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let result = manager.ensure_access().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
