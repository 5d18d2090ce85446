//! Artist collaboration graphs for Spotify playlists.
//!
//! This library authenticates against the Spotify Web API, collects every
//! track of a playlist and renders which artists appear together on a track
//! as a Graphviz `digraph`.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local authorization callback listener
//! - `cli` - Top-level command implementations
//! - `config` - Configuration management and environment variables
//! - `error` - The crate error type
//! - `graph` - Edge extraction and DOT rendering
//! - `management` - Token persistence
//! - `server` - Local HTTP listener for OAuth callbacks
//! - `spotify` - Spotify Web API client, authorization and pagination
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports an [`Error`]; the binary is
/// the only place where an error turns into process termination.
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Status output goes to standard error so standard output only ever carries
/// the playlist listing, the authorization URL and the rendered graph.
///
/// # Example
///
/// ```
/// info!("Using playlist: {}", name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 right after printing. Only the
/// binary's entry point uses it; library code returns [`Res`] instead.
///
/// # Example
///
/// ```
/// error!("{}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems, such as a token that could not be written
/// to disk but is still usable for the current run.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
