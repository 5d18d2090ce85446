use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use reqwest::Client;
use serde_json::json;
use tokio::net::TcpListener;

use artist_graph::{
    Error, Res,
    config::Config,
    management::TokenStore,
    spotify::{
        SpotifyClient,
        auth::{Authorizer, acquire_client, authorize_url, begin_authorization, token_from_response},
        client::needs_refresh,
    },
    types::{AuthResult, Token, TokenResponse},
};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "artist-graph-auth-test-{}-{}",
        std::process::id(),
        name
    ))
}

fn test_config(token_url: &str) -> Arc<Config> {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SPOTIFY_ID", "client-id".to_string()),
        ("SPOTIFY_SECRET", "client-secret".to_string()),
        ("SPOTIFY_TOKEN_URL", token_url.to_string()),
    ]);
    Arc::new(Config::from_lookup(|key: &str| vars.get(key).cloned()).unwrap())
}

fn fresh_token() -> Token {
    Token {
        access_token: "new-access".to_string(),
        refresh_token: "new-refresh".to_string(),
        token_type: "Bearer".to_string(),
        expiry: 4_000_000_000,
    }
}

// Authorizer that counts its invocations and hands out a fixed token.
struct FakeAuthorizer {
    calls: AtomicUsize,
}

impl FakeAuthorizer {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Authorizer for FakeAuthorizer {
    async fn authorize(&self, config: Arc<Config>) -> Res<AuthResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let token = fresh_token();
        Ok(AuthResult {
            client: SpotifyClient::new(config, token.clone()),
            token,
        })
    }
}

// Token endpoint that accepts the code "good-code" only.
async fn token_endpoint(Form(form): Form<HashMap<String, String>>) -> Response {
    let valid = form.get("grant_type").map(String::as_str) == Some("authorization_code")
        && form.get("code").map(String::as_str) == Some("good-code");

    if valid {
        Json(json!({
            "access_token": "issued-access",
            "token_type": "Bearer",
            "scope": "playlist-read-private",
            "expires_in": 3600,
            "refresh_token": "issued-refresh"
        }))
        .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })),
        )
            .into_response()
    }
}

async fn spawn_token_endpoint() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/api/token", post(token_endpoint));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn callback_listener() -> TcpListener {
    TcpListener::bind("127.0.0.1:0").await.unwrap()
}

#[tokio::test]
async fn test_stored_refresh_token_skips_authorization() {
    let dir = temp_path("stored");
    let store = TokenStore::new(dir.join("tokens.toml"));
    let stored = Token {
        access_token: "old-access".to_string(),
        refresh_token: "old-refresh".to_string(),
        token_type: "Bearer".to_string(),
        expiry: 1_600_000_000,
    };
    store.persist(&stored).await.unwrap();
    let authorizer = FakeAuthorizer::new();

    let client = acquire_client(test_config("http://127.0.0.1:9/api/token"), &store, &authorizer)
        .await
        .unwrap();

    assert_eq!(authorizer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.token().await, stored);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_missing_token_runs_authorization_and_persists() {
    let dir = temp_path("fresh");
    let store = TokenStore::new(dir.join("tokens.toml"));
    let authorizer = FakeAuthorizer::new();

    let client = acquire_client(test_config("http://127.0.0.1:9/api/token"), &store, &authorizer)
        .await
        .unwrap();

    assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.token().await, fresh_token());
    assert_eq!(store.load().await.unwrap(), fresh_token());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_token_without_refresh_runs_authorization() {
    let dir = temp_path("no-refresh");
    let store = TokenStore::new(dir.join("tokens.toml"));
    store
        .persist(&Token {
            access_token: "only-access".to_string(),
            ..Token::default()
        })
        .await
        .unwrap();
    let authorizer = FakeAuthorizer::new();

    acquire_client(test_config("http://127.0.0.1:9/api/token"), &store, &authorizer)
        .await
        .unwrap();

    assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_failed_token_write_is_not_fatal() {
    let dir = temp_path("blocked");
    std::fs::create_dir_all(&dir).unwrap();
    // a regular file where the token directory should be
    let blocker = dir.join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let store = TokenStore::new(blocker.join("tokens.toml"));
    let authorizer = FakeAuthorizer::new();

    let client = acquire_client(test_config("http://127.0.0.1:9/api/token"), &store, &authorizer)
        .await
        .unwrap();

    assert_eq!(client.token().await, fresh_token());

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn test_authorize_url() {
    let config = test_config("http://127.0.0.1:9/api/token");

    let url = reqwest::Url::parse(&authorize_url(&config, "xyz").unwrap()).unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert!(url.as_str().starts_with("https://accounts.spotify.com/authorize?"));
    assert_eq!(params["client_id"], "client-id");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8080/callback");
    assert_eq!(params["scope"], "playlist-read-private");
    assert_eq!(params["state"], "xyz");
}

#[test]
fn test_token_from_response() {
    let body: TokenResponse = serde_json::from_value(json!({
        "access_token": "a",
        "token_type": "Bearer",
        "expires_in": 3600,
        "refresh_token": "r"
    }))
    .unwrap();

    let token = token_from_response(body, "old", 1_000);

    assert_eq!(token.access_token, "a");
    assert_eq!(token.refresh_token, "r");
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expiry, 4_600);
}

#[test]
fn test_refresh_keeps_previous_refresh_token() {
    let body: TokenResponse = serde_json::from_value(json!({
        "access_token": "a",
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .unwrap();

    assert_eq!(token_from_response(body, "old", 0).refresh_token, "old");
}

#[test]
fn test_needs_refresh() {
    let token = Token {
        access_token: "a".to_string(),
        refresh_token: "r".to_string(),
        token_type: "Bearer".to_string(),
        expiry: 10_000,
    };

    assert!(!needs_refresh(&token, 5_000));
    assert!(needs_refresh(&token, 9_800));
    assert!(needs_refresh(&token, 20_000));
    assert!(needs_refresh(
        &Token {
            access_token: String::new(),
            ..token
        },
        0
    ));
}

#[tokio::test]
async fn test_callback_hands_token_to_waiting_flow() {
    let token_addr = spawn_token_endpoint().await;
    let config = test_config(&format!("http://{token_addr}/api/token"));

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_millis(50),
    )
    .await
    .unwrap();
    assert!(pending.url.contains(&format!("state={}", pending.state)));

    let response = Client::new()
        .get(format!("http://{}/callback", pending.local_addr))
        .query(&[("code", "good-code"), ("state", pending.state.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().contains("window.close()"));

    let result = pending.wait().await.unwrap();
    assert_eq!(result.token.access_token, "issued-access");
    assert_eq!(result.token.refresh_token, "issued-refresh");
    assert_eq!(result.token.token_type, "Bearer");
    assert!(result.token.expiry > chrono::Utc::now().timestamp());
    assert_eq!(result.client.token().await, result.token);
}

#[tokio::test]
async fn test_only_first_callback_is_honoured() {
    let token_addr = spawn_token_endpoint().await;
    let config = test_config(&format!("http://{token_addr}/api/token"));

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    let callback = format!("http://{}/callback", pending.local_addr);
    let state = pending.state.clone();
    let query = [("code", "good-code"), ("state", state.as_str())];

    let first = Client::new().get(&callback).query(&query).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);

    let second = Client::new().get(&callback).query(&query).send().await.unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::FORBIDDEN);

    assert!(pending.wait().await.is_ok());
}

#[tokio::test]
async fn test_state_mismatch_is_forbidden() {
    let token_addr = spawn_token_endpoint().await;
    let config = test_config(&format!("http://{token_addr}/api/token"));

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_millis(50),
    )
    .await
    .unwrap();

    let response = Client::new()
        .get(format!("http://{}/callback", pending.local_addr))
        .query(&[("code", "good-code"), ("state", "forged")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    assert!(matches!(pending.wait().await, Err(Error::StateMismatch)));
}

#[tokio::test]
async fn test_rejected_code_is_forbidden() {
    let token_addr = spawn_token_endpoint().await;
    let config = test_config(&format!("http://{token_addr}/api/token"));

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_millis(50),
    )
    .await
    .unwrap();

    let response = Client::new()
        .get(format!("http://{}/callback", pending.local_addr))
        .query(&[("code", "bad-code"), ("state", pending.state.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    match pending.wait().await {
        Err(Error::TokenExchange(message)) => {
            assert!(message.contains("Invalid authorization code"))
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("rejected code produced a token"),
    }
}

#[tokio::test]
async fn test_provider_error_is_forbidden() {
    let config = test_config("http://127.0.0.1:9/api/token");

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_millis(50),
    )
    .await
    .unwrap();

    let response = Client::new()
        .get(format!("http://{}/callback", pending.local_addr))
        .query(&[("error", "access_denied"), ("state", pending.state.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    assert!(matches!(
        pending.wait().await,
        Err(Error::AuthDenied(reason)) if reason == "access_denied"
    ));
}

#[tokio::test]
async fn test_listener_shuts_down_after_grace_period() {
    let token_addr = spawn_token_endpoint().await;
    let config = test_config(&format!("http://{token_addr}/api/token"));

    let pending = begin_authorization(
        config,
        Client::new(),
        callback_listener().await,
        Duration::from_millis(50),
    )
    .await
    .unwrap();
    let callback = format!("http://{}/callback", pending.local_addr);
    let state = pending.state.clone();

    let response = Client::new()
        .get(&callback)
        .query(&[("code", "good-code"), ("state", state.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    pending.wait().await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;

    let after = Client::new()
        .get(&callback)
        .query(&[("code", "good-code"), ("state", state.as_str())])
        .send()
        .await;
    assert!(after.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_forbidden_response_is_written_before_failure_returns() {
    use std::io::{ErrorKind, Read, Write};

    for _ in 0..20 {
        let config = test_config("http://127.0.0.1:9/api/token");
        let pending = begin_authorization(
            config,
            Client::new(),
            callback_listener().await,
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        let mut stream = std::net::TcpStream::connect(pending.local_addr).unwrap();
        stream
            .write_all(
                b"GET /callback?error=access_denied&state=x HTTP/1.1\r\n\
                  Host: 127.0.0.1\r\n\
                  Connection: close\r\n\r\n",
            )
            .unwrap();
        stream.set_nonblocking(true).unwrap();

        assert!(matches!(pending.wait().await, Err(Error::AuthDenied(_))));

        // No waiting here: the bytes must already be in the socket buffer.
        let mut buf = [0u8; 512];
        let read = match stream.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => 0,
            Err(e) => panic!("read failed: {e}"),
        };
        assert!(
            buf[..read].starts_with(b"HTTP/1.1 403"),
            "403 not written when wait() returned: {:?}",
            String::from_utf8_lossy(&buf[..read])
        );
    }
}
