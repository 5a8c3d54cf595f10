use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use tracing::info;

use super::AppState;
use crate::protocol::McpRequest;
use crate::sse::single_event_stream;

/// Handle `POST /mcp/request`: one request in, one terminal SSE event out.
pub async fn handle(
    State(state): State<AppState>,
    Json(request): Json<McpRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(id = %request.id, method = %request.method, "Received MCP request");
    Sse::new(single_event_stream(state.dispatcher.clone(), request)).keep_alive(KeepAlive::default())
}
