use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::{spotify::auth::AuthSession, types::CallbackParams};

/// Confirmation page; closes its own tab shortly after loading.
pub const SUCCESS_PAGE: &str = r#"<html>
  <head>
    <script>window.setTimeout(function(){window.close()}, 2500)</script>
  </head>
  <body>Success</body>
</html>"#;

pub async fn callback(
    State(session): State<Arc<AuthSession>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if session.complete(params).await {
        Html(SUCCESS_PAGE).into_response()
    } else {
        (StatusCode::FORBIDDEN, "Couldn't get token").into_response()
    }
}
