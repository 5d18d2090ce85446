//! # Spotify Integration Module
//!
//! Everything that talks to Spotify lives here:
//!
//! - [`auth`] - token acquisition: reuse of a stored token, the loopback
//!   authorization-code flow, code exchange and refresh
//! - [`client`] - the authenticated Web API client and the [`SpotifyApi`]
//!   trait the rest of the crate is written against
//! - [`playlists`] - offset pagination over playlists and playlist tracks
//!
//! ## API Coverage
//!
//! - `GET /me` - current user profile
//! - `GET /me/playlists` - the user's playlists
//! - `GET /playlists/{id}/tracks` - playlist entries
//! - `POST /api/token` - code exchange and refresh (accounts service)

pub mod auth;
pub mod client;
pub mod playlists;

pub use client::{SpotifyApi, SpotifyClient};
