//! Configuration management for artist-graph.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the user's configuration directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file under `<config dir>/artist_graph/`
//! 3. Application defaults for everything except the client credentials
//!
//! [`Config`] is read once at startup and passed explicitly to whatever needs
//! it. Nothing in the crate reads the environment after that.

use std::{env, net::SocketAddr, path::PathBuf};

use reqwest::Url;

use crate::{Error, Res, types::Credentials};

pub const APP_DIR: &str = "artist_graph";
pub const TOKEN_FILE: &str = "tokens.toml";

pub const ENV_CLIENT_ID: &str = "SPOTIFY_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_SECRET";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_REDIRECT_URI";
pub const ENV_SERVER_ADDRESS: &str = "SERVER_ADDRESS";
pub const ENV_API_URL: &str = "SPOTIFY_API_URL";
pub const ENV_AUTH_URL: &str = "SPOTIFY_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "SPOTIFY_TOKEN_URL";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scope requested during authorization. Reading private playlists is all the
/// graph needs.
pub const SCOPE: &str = "playlist-read-private";

/// Loads environment variables from `<config dir>/artist_graph/.env`.
///
/// Creates the directory if it doesn't exist. A missing `.env` file is not an
/// error, variables can just as well come from the shell. Variables that are
/// already set are never overwritten.
///
/// # Directory Structure
///
/// - Linux: `~/.config/artist_graph/.env`
/// - macOS: `~/Library/Application Support/artist_graph/.env`
/// - Windows: `%APPDATA%/artist_graph/.env`
pub async fn load_env() -> Res<()> {
    let mut path = app_dir()?;
    async_fs::create_dir_all(&path).await?;
    path.push(".env");

    if path.exists() {
        dotenv::from_path(&path).map_err(|e| Error::InvalidConfig {
            name: "dotenv",
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Returns `<config dir>/artist_graph`.
pub fn app_dir() -> Res<PathBuf> {
    let mut path = dirs::config_dir().ok_or(Error::NoConfigDir)?;
    path.push(APP_DIR);
    Ok(path)
}

/// Returns the default location of the persisted token file.
pub fn default_token_path() -> Res<PathBuf> {
    Ok(app_dir()?.join(TOKEN_FILE))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub redirect_uri: String,
    pub server_addr: SocketAddr,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    token_file: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Res<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// `SPOTIFY_ID` and `SPOTIFY_SECRET` are required. Every other variable
    /// falls back to its default.
    pub fn from_lookup<F>(lookup: F) -> Res<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup(ENV_CLIENT_ID).ok_or(Error::MissingEnv(ENV_CLIENT_ID))?;
        let client_secret =
            lookup(ENV_CLIENT_SECRET).ok_or(Error::MissingEnv(ENV_CLIENT_SECRET))?;

        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let redirect_uri = parse_url(
            ENV_REDIRECT_URI,
            or_default(ENV_REDIRECT_URI, DEFAULT_REDIRECT_URI),
        )?;
        let api_url = parse_url(ENV_API_URL, or_default(ENV_API_URL, DEFAULT_API_URL))?;
        let auth_url = parse_url(ENV_AUTH_URL, or_default(ENV_AUTH_URL, DEFAULT_AUTH_URL))?;
        let token_url = parse_url(ENV_TOKEN_URL, or_default(ENV_TOKEN_URL, DEFAULT_TOKEN_URL))?;

        let server_addr = or_default(ENV_SERVER_ADDRESS, DEFAULT_SERVER_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| Error::InvalidConfig {
                name: ENV_SERVER_ADDRESS,
                reason: e.to_string(),
            })?;

        Ok(Self {
            credentials: Credentials {
                client_id,
                client_secret,
            },
            redirect_uri,
            server_addr,
            api_url: api_url.trim_end_matches('/').to_string(),
            auth_url,
            token_url,
            token_file: None,
        })
    }

    /// Replaces the token file location when `path` is given.
    pub fn with_token_path(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.token_file = path;
        }
        self
    }

    /// Location of the token file: the override if one was given, the default
    /// under the configuration directory otherwise.
    pub fn token_path(&self) -> Res<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => default_token_path(),
        }
    }
}

fn parse_url(name: &'static str, value: String) -> Res<String> {
    Url::parse(&value).map_err(|e| Error::InvalidConfig {
        name,
        reason: e.to_string(),
    })?;
    Ok(value)
}
