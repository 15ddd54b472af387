//! Health endpoint.

use axum::Json;
use serde_json::{Value, json};

/// `GET /health` — liveness probe.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": authkit_core::version(),
    }))
}
