//! Dispatch behavior against live (local) backends and providers.

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use toolbus_common::{CommandEnvelope, CommandStatus, ResultEnvelope};
use toolbus_router::{AiConfig, RouterConfig, RouterState};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A port that refuses connections.
async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn envelope(command: &str, params: Value) -> CommandEnvelope {
    let params = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    CommandEnvelope::new(command, params)
}

#[tokio::test]
async fn unreachable_asset_backend_yields_shaped_error() {
    let config = RouterConfig {
        asset_backend_url: refused_url().await,
        backend_timeout: Duration::from_secs(2),
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("import_asset", json!({"path": "x"})))
        .await;

    assert_eq!(result.status, CommandStatus::Error);
    let message = result.message;
    assert!(
        message.contains("HTTP") || message.contains("connection"),
        "unexpected message: {}",
        message
    );
}

#[tokio::test]
async fn backend_error_status_is_reported_not_relayed() {
    let app = Router::new().route(
        "/command",
        post(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let config = RouterConfig {
        engine_backend_url: serve(app).await,
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("create_level", json!({"name": "TestMap"})))
        .await;
    assert_eq!(result.status, CommandStatus::Error);
    assert!(result.message.contains("HTTP"));
}

#[tokio::test]
async fn reachable_backend_envelope_is_relayed_verbatim() {
    let app = Router::new().route(
        "/command",
        post(|Json(received): Json<CommandEnvelope>| async move {
            let mut data = Map::new();
            data.insert("echoed".to_string(), json!(received.command));
            Json(ResultEnvelope::success("backend did the thing", data))
        }),
    );
    let config = RouterConfig {
        engine_backend_url: serve(app).await,
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("place_actor", json!({"name": "Barrel_1"})))
        .await;
    assert!(result.is_success());
    assert_eq!(result.message, "backend did the thing");
    assert_eq!(result.data["echoed"], json!("place_actor"));
}

#[tokio::test]
async fn unknown_commands_never_reach_a_backend() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/command",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Json(ResultEnvelope::success("ok", Map::new()))
            }
        }),
    );
    let backend = serve(app).await;

    let config = RouterConfig {
        asset_backend_url: backend.clone(),
        engine_backend_url: backend,
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state.dispatch(envelope("definitely_not_a_command", json!({}))).await;
    assert_eq!(result.status, CommandStatus::Error);
    assert!(result.message.contains("definitely_not_a_command"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

fn ai_config(base_url: String) -> AiConfig {
    AiConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        request_timeout: Duration::from_millis(200),
        ..AiConfig::default()
    }
}

#[tokio::test]
async fn generative_timeout_falls_back_with_prompt_echo() {
    // A provider that never answers within the request timeout.
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({}))
        }),
    );
    let config = RouterConfig {
        ai: ai_config(serve(app).await),
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("generate_texture", json!({"prompt": "rusty barrel"})))
        .await;

    assert_eq!(result.status, CommandStatus::Success);
    assert!(result.data["content"].as_str().unwrap().contains("rusty barrel"));
    assert_eq!(result.data["provider"], json!("fallback"));
}

#[tokio::test]
async fn generative_provider_error_falls_back() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let config = RouterConfig {
        ai: ai_config(serve(app).await),
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("generate_content", json!({"prompt": "a quest log"})))
        .await;

    assert_eq!(result.status, CommandStatus::Success);
    assert!(result.data["content"].as_str().unwrap().contains("a quest log"));
    assert_eq!(result.data["provider"], json!("fallback"));
}

#[tokio::test]
async fn generative_unreachable_provider_falls_back() {
    let config = RouterConfig {
        ai: ai_config(refused_url().await),
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("generate_content", json!({"prompt": "tavern sign"})))
        .await;

    assert_eq!(result.status, CommandStatus::Success);
    assert!(!result.data["content"].as_str().unwrap().is_empty());
    assert_eq!(result.data["provider"], json!("fallback"));
}

#[tokio::test]
async fn generative_success_carries_provider_content() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            Json(json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "A weathered oak barrel."}}
                ]
            }))
        }),
    );
    let config = RouterConfig {
        ai: ai_config(serve(app).await),
        ..RouterConfig::default()
    };
    let state = RouterState::new(config);

    let result = state
        .dispatch(envelope("generate_content", json!({"prompt": "barrel"})))
        .await;

    assert!(result.is_success());
    assert_eq!(result.data["content"], json!("A weathered oak barrel."));
    assert_eq!(result.data["provider"], json!("openai"));
}
