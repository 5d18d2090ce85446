use std::{net::SocketAddr, sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{
    Error, Res,
    config::{self, Config},
    info,
    management::TokenStore,
    server::start_api_server,
    spotify::client::{SpotifyClient, check_status},
    success,
    types::{AuthResult, CallbackParams, Token, TokenResponse},
    utils, warning,
};

/// How long the callback listener stays up after delivering its result, so
/// the confirmation page can reach the browser.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Produces an authenticated client.
///
/// A stored token with a refresh token is always used as is. Only when there
/// is none does the `authorizer` run, and its token is persisted before the
/// client is returned. A failed write is reported but the in-memory token is
/// still good for this run.
pub async fn acquire_client<A: Authorizer>(
    config: Arc<Config>,
    store: &TokenStore,
    authorizer: &A,
) -> Res<SpotifyClient> {
    let token = store.load().await?;
    if !token.refresh_token.is_empty() {
        return Ok(SpotifyClient::new(config, token));
    }

    let AuthResult { client, token } = authorizer.authorize(config).await?;
    match store.persist(&token).await {
        Ok(()) => success!("Tokens saved to {}", store.path().display()),
        Err(e) => warning!("Unable to write tokens: {}", e),
    }
    Ok(client)
}

/// Interactive source of fresh tokens.
#[allow(async_fn_in_trait)]
pub trait Authorizer {
    async fn authorize(&self, config: Arc<Config>) -> Res<AuthResult>;
}

/// Authorization-code flow completed through a local HTTP listener.
///
/// Binds the configured loopback address, prints the authorization URL and
/// waits, without timeout, for the provider's redirect.
pub struct LoopbackAuthorizer {
    open_browser: bool,
}

impl LoopbackAuthorizer {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }
}

impl Authorizer for LoopbackAuthorizer {
    async fn authorize(&self, config: Arc<Config>) -> Res<AuthResult> {
        let listener = TcpListener::bind(config.server_addr).await?;
        let pending = begin_authorization(config, Client::new(), listener, SHUTDOWN_GRACE).await?;

        info!(
            "Open the following URL to authorize (listening on {}):",
            pending.local_addr
        );
        println!("{}", pending.url);

        if self.open_browser && webbrowser::open(&pending.url).is_err() {
            warning!("Failed to open browser. Please navigate to the URL above manually.");
        }

        pending.wait().await
    }
}

/// An authorization waiting for its callback.
pub struct PendingAuthorization {
    pub url: String,
    pub state: String,
    pub local_addr: SocketAddr,
    result: oneshot::Receiver<Res<AuthResult>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    server: JoinHandle<()>,
}

impl PendingAuthorization {
    /// Suspends until the callback handler delivers its result.
    ///
    /// On failure the listener is stopped and joined before the error is
    /// returned, so the 403 is on the wire before the caller can exit.
    pub async fn wait(self) -> Res<AuthResult> {
        let outcome = self.result.await.unwrap_or(Err(Error::HandoffClosed));
        if outcome.is_err() {
            if let Some(trigger) = self.shutdown.lock().await.take() {
                let _ = trigger.send(());
            }
            if let Err(e) = self.server.await {
                warning!("Authorization listener task failed: {}", e);
            }
        }
        outcome
    }
}

/// Starts the callback listener on `listener` and returns the URL the user has
/// to open together with the receiving end of the handoff.
pub async fn begin_authorization(
    config: Arc<Config>,
    http: Client,
    listener: TcpListener,
    grace: Duration,
) -> Res<PendingAuthorization> {
    let state = utils::generate_state();
    let url = authorize_url(&config, &state)?;
    let local_addr = listener.local_addr()?;

    let (result_tx, result_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let shutdown = Arc::new(Mutex::new(Some(shutdown_tx)));

    let session = Arc::new(AuthSession {
        config,
        http,
        state: state.clone(),
        result: Mutex::new(Some(result_tx)),
        shutdown: Arc::clone(&shutdown),
        grace,
    });

    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(listener, session, shutdown_rx).await {
            warning!("Authorization listener failed: {}", e);
        }
    });

    Ok(PendingAuthorization {
        url,
        state,
        local_addr,
        result: result_rx,
        shutdown,
        server,
    })
}

/// State shared between the callback handler and the waiting flow.
///
/// Both slots are single use. The first callback takes the result sender,
/// every later callback finds it empty. The shutdown trigger is shared with
/// [`PendingAuthorization`]: a successful callback fires it after the grace
/// period, a failed one leaves it to the waiting flow.
pub struct AuthSession {
    config: Arc<Config>,
    http: Client,
    state: String,
    result: Mutex<Option<oneshot::Sender<Res<AuthResult>>>>,
    shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    grace: Duration,
}

impl AuthSession {
    /// Handles one callback and returns whether it produced a token.
    ///
    /// Success and failure are both delivered to the waiting flow. After a
    /// success the listener shuts down once the grace period has passed; after
    /// a failure [`PendingAuthorization::wait`] stops it right away.
    pub async fn complete(&self, params: CallbackParams) -> bool {
        let Some(sender) = self.result.lock().await.take() else {
            warning!("Ignoring callback, authorization already completed");
            return false;
        };

        let outcome = match self.redeem(params).await {
            Ok(token) => Ok(AuthResult {
                client: SpotifyClient::with_http(
                    self.http.clone(),
                    Arc::clone(&self.config),
                    token.clone(),
                ),
                token,
            }),
            Err(e) => {
                warning!("Authorization failed: {}", e);
                Err(e)
            }
        };

        let succeeded = outcome.is_ok();
        if sender.send(outcome).is_err() {
            warning!("Authorization result had no receiver");
        }
        if succeeded {
            self.schedule_shutdown().await;
        }
        succeeded
    }

    async fn redeem(&self, params: CallbackParams) -> Res<Token> {
        if let Some(error) = params.error {
            return Err(Error::AuthDenied(error));
        }
        if params.state.as_deref() != Some(self.state.as_str()) {
            return Err(Error::StateMismatch);
        }
        let code = params.code.ok_or(Error::MissingCode)?;

        exchange_code(&self.http, &self.config, &code)
            .await
            .map_err(|e| Error::TokenExchange(e.to_string()))
    }

    async fn schedule_shutdown(&self) {
        if let Some(trigger) = self.shutdown.lock().await.take() {
            let grace = self.grace;
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                let _ = trigger.send(());
            });
        }
    }
}

/// Builds the provider's authorization URL for `state`.
pub fn authorize_url(config: &Config, state: &str) -> Res<String> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.credentials.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", config::SCOPE),
            ("state", state),
        ],
    )
    .map_err(|e| Error::InvalidConfig {
        name: config::ENV_AUTH_URL,
        reason: e.to_string(),
    })?;

    Ok(url.to_string())
}

/// Exchanges an authorization code for a token.
pub async fn exchange_code(http: &Client, config: &Config, code: &str) -> Res<Token> {
    let response = http
        .post(&config.token_url)
        .basic_auth(
            &config.credentials.client_id,
            Some(&config.credentials.client_secret),
        )
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let body: TokenResponse = check_status(response).await?.json().await?;
    Ok(token_from_response(body, "", Utc::now().timestamp()))
}

/// Trades a refresh token for a new access token.
pub async fn refresh_token(http: &Client, config: &Config, refresh_token: &str) -> Res<Token> {
    let response = http
        .post(&config.token_url)
        .basic_auth(
            &config.credentials.client_id,
            Some(&config.credentials.client_secret),
        )
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let body: TokenResponse = check_status(response).await?.json().await?;
    Ok(token_from_response(body, refresh_token, Utc::now().timestamp()))
}

/// Converts a token endpoint response obtained at unix time `now`.
///
/// The accounts service may leave out the refresh token when refreshing, in
/// which case `previous_refresh` is kept.
pub fn token_from_response(body: TokenResponse, previous_refresh: &str, now: i64) -> Token {
    Token {
        access_token: body.access_token,
        refresh_token: body
            .refresh_token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| previous_refresh.to_string()),
        token_type: body.token_type,
        expiry: now + body.expires_in,
    }
}
