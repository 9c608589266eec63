//! HTTP surface of the router.

use crate::dispatch::RouterState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use toolbus_common::{CommandEnvelope, ResultEnvelope};

/// Build the axum router.
///
/// `/status` and `/api/status` answer the readiness prober's contract; every
/// command path, alias or not, feeds the same dispatch.
pub fn create_router(state: Arc<RouterState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/api/status", get(status_handler))
        .route("/command", post(command_handler))
        .route("/api/asset/execute", post(command_handler))
        .route("/api/engine/execute", post(command_handler))
        .route("/api/ai/generate", post(command_handler))
        .with_state(state)
}

async fn status_handler(State(state): State<Arc<RouterState>>) -> Json<Value> {
    let config = state.config();
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "ai": {
            "provider": config.ai.provider,
            "model": config.ai.model,
            "status": if config.ai.api_key.is_some() { "configured" } else { "unconfigured" },
        },
        "asset": {
            "url": config.asset_backend_url,
            "mock": config.mock_backends,
        },
        "engine": {
            "url": config.engine_backend_url,
            "mock": config.mock_backends,
        },
    }))
}

async fn command_handler(
    State(state): State<Arc<RouterState>>,
    Json(envelope): Json<CommandEnvelope>,
) -> Json<ResultEnvelope> {
    Json(state.dispatch(envelope).await)
}
