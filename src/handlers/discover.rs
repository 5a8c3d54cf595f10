use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use super::AppState;
use crate::registry::MethodRegistry;

pub const SERVER_NAME: &str = "n8n MCP bridge";

/// Capability document built from the same registry the dispatcher
/// validates against.
pub fn discovery_document(registry: &MethodRegistry) -> Value {
    json!({
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": {
            "sse": true,
            "methods": registry.descriptors(),
        }
    })
}

/// Handle `GET /mcp/discover`.
pub async fn handle(State(state): State<AppState>) -> Json<Value> {
    debug!("Discovery requested");
    Json(discovery_document(state.dispatcher.registry()))
}
