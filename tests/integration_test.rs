// Integration tests for apiengine
//
// These tests drive the full client stack (settings, credential resolution,
// token exchange, authenticated requests) against a mock HTTP server.

use chrono::{Duration, Utc};
use mockito::Matcher;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

use apiengine::{
    auth::{self, ClientConfig, Token},
    ApiClient, AuthError, ClientError, Settings,
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

fn client_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(ClientConfig {
        base_url: server.url(),
        username: "bob".to_string(),
        password: "secret".to_string(),
    })
    .expect("Failed to create client")
}

async fn mock_auth(
    server: &mut mockito::ServerGuard,
    body: &str,
    hits: usize,
) -> mockito::Mock {
    server
        .mock("POST", "/auth")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"username": "bob", "password": "secret"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

fn write_settings(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("apiengine-it-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).expect("Failed to write settings");
    path
}

// ==================================================================================================
// Token Exchange Tests
// ==================================================================================================

#[tokio::test]
async fn test_authenticate_applies_expiration_margin() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":10}"#, 1).await;

    let client = client_for(&server);
    let before = Utc::now();
    let token = client.auth_manager().authenticate().await.unwrap();
    let after = Utc::now();

    assert_eq!(token.value, "abc");
    assert!(token.expires_at >= before + Duration::seconds(9));
    assert!(token.expires_at <= after + Duration::seconds(9));
    assert!(client.auth_manager().is_authenticated().await);

    auth_mock.assert_async().await;
}

#[tokio::test]
async fn test_auth_rejected_stores_no_token() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth")
        .with_status(401)
        .create_async()
        .await;
    let items = server.mock("GET", "/items").expect(0).create_async().await;
    let post_items = server.mock("POST", "/items").expect(0).create_async().await;

    let client = client_for(&server);

    let err = client.auth_manager().authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(401)));
    assert!(client.auth_manager().token().await.is_none());

    let err = client.get("/items").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::Rejected(401))));

    let err = client.post("/items", &HashMap::new()).await.unwrap_err();
    assert!(err.is_auth());

    items.assert_async().await;
    post_items.assert_async().await;
}

#[tokio::test]
async fn test_redirect_status_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/auth")
        .with_status(304)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.auth_manager().authenticate().await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(304)));
}

// ==================================================================================================
// Request Tests
// ==================================================================================================

#[tokio::test]
async fn test_get_attaches_token_and_returns_body_unchanged() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":10}"#, 1).await;
    let items = server
        .mock("GET", "/items")
        .match_header("User-Token", "abc")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body("[1, 2,  3]")
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let body = client.get("/items").await.unwrap();

    assert_eq!(&body[..], b"[1, 2,  3]");
    auth_mock.assert_async().await;
    items.assert_async().await;
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mut server = mockito::Server::new_async().await;
    mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":10}"#, 1).await;
    let create = server
        .mock("POST", "/items")
        .match_header("User-Token", "abc")
        .match_body(Matcher::Json(json!({"name": "widget", "color": "blue"})))
        .with_status(201)
        .with_body(r#"{"id":7}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let body = HashMap::from([
        ("name".to_string(), "widget".to_string()),
        ("color".to_string(), "blue".to_string()),
    ]);
    let response = client.post("/items", &body).await.unwrap();

    assert_eq!(&response[..], br#"{"id":7}"#);
    create.assert_async().await;
}

#[tokio::test]
async fn test_token_reused_across_calls() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":100}"#, 1).await;
    let items = server
        .mock("GET", "/items")
        .match_header("User-Token", "abc")
        .with_body("ok")
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server);
    for _ in 0..3 {
        client.get("/items").await.unwrap();
    }

    auth_mock.assert_async().await;
    items.assert_async().await;
}

#[tokio::test]
async fn test_preloaded_token_skips_auth() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":100}"#, 0).await;
    let items = server
        .mock("GET", "/items")
        .match_header("User-Token", "held")
        .with_body("ok")
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .auth_manager()
        .set_token(Token {
            value: "held".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
        })
        .await;

    client.get("/items").await.unwrap();

    auth_mock.assert_async().await;
    items.assert_async().await;
}

#[tokio::test]
async fn test_expired_token_is_renewed_before_request() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"fresh","expiration_seconds":100}"#, 1).await;
    let items = server
        .mock("GET", "/items")
        .match_header("User-Token", "fresh")
        .with_body("ok")
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .auth_manager()
        .set_token(Token {
            value: "stale".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        })
        .await;

    client.get("/items").await.unwrap();

    auth_mock.assert_async().await;
    items.assert_async().await;
}

#[tokio::test]
async fn test_zero_lifetime_token_reauthenticates_every_call() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":0}"#, 2).await;
    server
        .mock("GET", "/items")
        .with_body("ok")
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    client.get("/items").await.unwrap();
    client.get("/items").await.unwrap();

    auth_mock.assert_async().await;
}

#[tokio::test]
async fn test_error_status_body_is_returned() {
    let mut server = mockito::Server::new_async().await;
    mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":10}"#, 1).await;
    server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("not here")
        .create_async()
        .await;

    let client = client_for(&server);
    let body = client.get("/missing").await.unwrap();
    assert_eq!(&body[..], b"not here");
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    // Nothing listens on port 1; a held token means no exchange is attempted
    let client = ApiClient::new(ClientConfig {
        base_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    })
    .unwrap();
    client
        .auth_manager()
        .set_token(Token {
            value: "held".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
        })
        .await;

    let err = client.get("/items").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}

// ==================================================================================================
// Settings + Resolution Tests
// ==================================================================================================

#[tokio::test]
async fn test_argument_url_overrides_settings_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    mock_auth(&mut server, r#"{"result":"abc","expiration_seconds":10}"#, 1).await;
    let items = server
        .mock("GET", "/items")
        .match_header("User-Token", "abc")
        .with_body("from-override")
        .create_async()
        .await;

    let path = write_settings(
        r#"{"apiengine": {"url": "http://127.0.0.1:1/", "username": "bob", "password": "secret"}}"#,
    );
    let settings = Settings::load(Some(&path)).unwrap();
    std::fs::remove_file(&path).ok();

    let override_arg = format!("apiengineUrl:{}/", server.url());
    let config = auth::resolve(&settings, ["apiengine", "get", "/items", override_arg.as_str()]);
    assert_eq!(config.base_url, format!("{}/", server.url()));

    let client = ApiClient::new(config).unwrap();
    let body = client.get("/items").await.unwrap();

    assert_eq!(&body[..], b"from-override");
    items.assert_async().await;
}

#[tokio::test]
async fn test_blank_password_override_is_sent() {
    let mut server = mockito::Server::new_async().await;
    let auth_mock = server
        .mock("POST", "/auth")
        .match_body(Matcher::Json(json!({"username": "bob", "password": ""})))
        .with_status(401)
        .create_async()
        .await;

    let path = write_settings(r#"{"apiengine": {"username": "bob", "password": "secret"}}"#);
    let settings = Settings::load(Some(&path)).unwrap();
    std::fs::remove_file(&path).ok();

    let url_arg = format!("apiengineUrl:{}", server.url());
    let config = auth::resolve(&settings, [url_arg.as_str(), "apienginePassword"]);
    assert_eq!(config.password, "");

    let client = ApiClient::new(config).unwrap();
    let err = client.get("/items").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::Rejected(401))));

    auth_mock.assert_async().await;
}
