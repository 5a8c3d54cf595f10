pub mod discover;
pub mod health;
pub mod request;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Build the HTTP surface:
///
/// - `GET /mcp/discover` — registry advertisement
/// - `POST /mcp/request` — dispatch, answered with a single SSE event
/// - `GET /healthz` — liveness
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/mcp/discover", get(discover::handle))
        .route("/mcp/request", post(request::handle))
        .route("/healthz", get(health::handle))
        .with_state(AppState { dispatcher })
        .layer(TraceLayer::new_for_http())
}
