//! # CLI Module
//!
//! Command implementations behind the `artist-graph` binary.
//!
//! - [`auth`] obtains an authenticated client: the stored token when it has a
//!   refresh token, the interactive loopback flow otherwise.
//! - [`playlist`] either lists the user's playlists or renders the artist
//!   collaboration graph of one of them.
//!
//! ## Usage
//!
//! ```bash
//! artist-graph                     # list your playlists
//! artist-graph "Road Trip" > g.dot # graph of one playlist
//! dot -Tsvg g.dot > g.svg
//! ```
//!
//! Standard output only carries the listing, the authorization URL and the
//! graph, so it can be redirected straight into Graphviz. Status messages go
//! to standard error.

pub mod auth;
pub mod playlist;

pub use auth::get_client;
pub use playlist::{graph_playlist, list_playlists, run};
