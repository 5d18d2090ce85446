use std::sync::Arc;

use crate::{
    Res,
    config::Config,
    info,
    management::TokenStore,
    spotify::{
        SpotifyApi, SpotifyClient,
        auth::{LoopbackAuthorizer, acquire_client},
    },
};

/// Returns a client for the user, authorizing interactively if no usable
/// token is stored, and confirms it works by fetching the user profile.
pub async fn get_client(config: Arc<Config>, open_browser: bool) -> Res<SpotifyClient> {
    let store = TokenStore::new(config.token_path()?);
    let client = acquire_client(config, &store, &LoopbackAuthorizer::new(open_browser)).await?;

    let user = client.current_user().await?;
    info!("User: {}", user.display_name.as_deref().unwrap_or(&user.id));
    Ok(client)
}
