use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::oneshot};

use crate::{Res, api, spotify::auth::AuthSession};

/// Serves `/callback` on `listener` until `shutdown` fires or its sender is
/// dropped.
pub async fn start_api_server(
    listener: TcpListener,
    session: Arc<AuthSession>,
    shutdown: oneshot::Receiver<()>,
) -> Res<()> {
    let app = Router::new()
        .route("/callback", get(api::callback))
        .with_state(session);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await?;
    Ok(())
}
