//! Error type shared by every layer of the crate.
//!
//! Library functions return [`crate::Res`]; only the binary decides whether an
//! error terminates the process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("${0} not set")]
    MissingEnv(&'static str),

    #[error("Invalid value for ${name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("Unable to locate the user configuration directory")]
    NoConfigDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error loading token file: {0}")]
    TokenDecode(#[from] toml::de::Error),

    #[error("Unable to encode tokens: {0}")]
    TokenEncode(#[from] toml::ser::Error),

    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authorization denied by provider: {0}")]
    AuthDenied(String),

    #[error("Authorization callback did not carry a code")]
    MissingCode,

    #[error("Authorization callback state mismatch")]
    StateMismatch,

    #[error("Couldn't get token: {0}")]
    TokenExchange(String),

    #[error("Authorization listener stopped before delivering a token")]
    HandoffClosed,

    #[error("No matching playlist: {0}")]
    PlaylistNotFound(String),
}
