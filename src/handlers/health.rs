use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. Never touches n8n.
pub async fn handle() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
