use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};

/// Random value for the `state` parameter of an authorization request.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Removes every double quote from a track title.
pub fn strip_quotes(title: &str) -> String {
    title.replace('"', "")
}

/// Turns a track title into a quoted-string-safe DOT label: double quotes are
/// dropped, backslashes escaped.
pub fn dot_label(title: &str) -> String {
    escape_dot_id(&strip_quotes(title))
}

/// Escapes backslashes and double quotes so `value` can sit inside a quoted
/// DOT identifier.
pub fn escape_dot_id(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Spinner drawn on standard error while a long fetch is running.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
