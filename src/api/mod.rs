//! # API Module
//!
//! HTTP handlers served by the temporary authorization listener.
//!
//! - [`callback`] - receives the provider's redirect, redeems the
//!   authorization code and hands the result to the waiting flow. Answers
//!   with [`SUCCESS_PAGE`] on success and `403 Forbidden` otherwise.
//!
//! The listener itself is started by [`crate::server::start_api_server`].

mod callback;

pub use callback::{SUCCESS_PAGE, callback};
