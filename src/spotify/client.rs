use std::sync::Arc;

use chrono::Utc;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    Error, Res,
    config::Config,
    spotify::auth,
    types::{Page, Playlist, PlaylistItem, Token, User},
};

/// Seconds before expiry at which the access token is refreshed.
pub const REFRESH_MARGIN_SECS: i64 = 240;

/// The Web API operations the graph builder needs.
///
/// [`SpotifyClient`] talks to Spotify; tests provide in-memory fakes.
#[allow(async_fn_in_trait)]
pub trait SpotifyApi {
    async fn current_user(&self) -> Res<User>;

    async fn playlists_page(&self, limit: u32, offset: u32) -> Res<Page<Playlist>>;

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Res<Page<PlaylistItem>>;
}

/// Authenticated Spotify Web API client.
///
/// Holds the token it was built from and refreshes it lazily: nothing goes
/// over the network until the first request, and a refresh only happens when
/// the access token is missing or about to expire.
pub struct SpotifyClient {
    http: Client,
    config: Arc<Config>,
    token: Mutex<Token>,
}

impl SpotifyClient {
    pub fn new(config: Arc<Config>, token: Token) -> Self {
        Self::with_http(Client::new(), config, token)
    }

    pub fn with_http(http: Client, config: Arc<Config>, token: Token) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(token),
        }
    }

    /// Snapshot of the token currently in use.
    pub async fn token(&self) -> Token {
        self.token.lock().await.clone()
    }

    async fn access_token(&self) -> Res<String> {
        let mut token = self.token.lock().await;
        if needs_refresh(&token, Utc::now().timestamp()) {
            let refreshed =
                auth::refresh_token(&self.http, &self.config, &token.refresh_token).await?;
            *token = refreshed;
        }
        Ok(token.access_token.clone())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Res<T> {
        let access_token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}{}", self.config.api_url, path))
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl SpotifyApi for SpotifyClient {
    async fn current_user(&self) -> Res<User> {
        self.get("/me", &[]).await
    }

    async fn playlists_page(&self, limit: u32, offset: u32) -> Res<Page<Playlist>> {
        self.get(
            "/me/playlists",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Res<Page<PlaylistItem>> {
        self.get(
            &format!("/playlists/{playlist_id}/tracks"),
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("fields", "total,items(track(name,artists(name)))".to_string()),
            ],
        )
        .await
    }
}

/// Whether `token` has to be refreshed before use at unix time `now`.
pub fn needs_refresh(token: &Token, now: i64) -> bool {
    token.access_token.is_empty() || now >= token.expiry - REFRESH_MARGIN_SECS
}

/// Passes successful responses through and turns everything else into
/// [`Error::Api`] carrying the provider's message.
pub(crate) async fn check_status(response: Response) -> Res<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

// Web API errors look like {"error":{"status":..,"message":..}}, the accounts
// service uses {"error":"..","error_description":".."}.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    json["error"]["message"]
        .as_str()
        .or_else(|| json["error_description"].as_str())
        .or_else(|| json["error"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}
