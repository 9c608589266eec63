//! Fake backend for supervisor and router testing.
//!
//! Serves the backend wire contract (`/status` + `/command`) with knobs to
//! simulate slow startup, a backend that never becomes ready, and one that
//! ignores graceful termination.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use toolbus_common::{CommandEnvelope, ResultEnvelope};
use tracing::info;

/// Fake command backend for toolbus testing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 = random)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Backend label reported in responses
    #[arg(long, default_value = "fake")]
    id: String,

    /// Milliseconds after startup before /status reports running
    #[arg(long, default_value = "0")]
    startup_delay_ms: u64,

    /// Never report running (for readiness-timeout tests)
    #[arg(long)]
    never_ready: bool,

    /// Ignore SIGTERM so only a forced kill stops the process
    #[arg(long)]
    ignore_sigterm: bool,
}

struct BackendState {
    id: String,
    started: Instant,
    startup_delay: Duration,
    never_ready: bool,
}

impl BackendState {
    fn is_running(&self) -> bool {
        !self.never_ready && self.started.elapsed() >= self.startup_delay
    }
}

fn app(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/api/status", get(status_handler))
        .route("/command", post(command_handler))
        .with_state(state)
}

async fn status_handler(State(state): State<Arc<BackendState>>) -> Json<Value> {
    let status = if state.is_running() { "running" } else { "starting" };
    Json(json!({"status": status, "backend": state.id}))
}

async fn command_handler(
    State(state): State<Arc<BackendState>>,
    Json(envelope): Json<CommandEnvelope>,
) -> Json<ResultEnvelope> {
    let mut data = Map::new();
    data.insert("command".to_string(), json!(envelope.command));
    data.insert("params".to_string(), Value::Object(envelope.params));
    data.insert("backend".to_string(), json!(state.id));
    Json(ResultEnvelope::success(
        format!("command '{}' executed", envelope.command),
        data,
    ))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    #[cfg(unix)]
    if args.ignore_sigterm {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler");
        tokio::spawn(async move {
            loop {
                sigterm.recv().await;
                info!("ignoring SIGTERM");
            }
        });
    }

    let state = Arc::new(BackendState {
        id: args.id,
        started: Instant::now(),
        startup_delay: Duration::from_millis(args.startup_delay_ms),
        never_ready: args.never_ready,
    });

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", args.host, args.port))
        .await
        .expect("Failed to bind");
    info!(
        "fakebackend '{}' listening on {}",
        state.id,
        listener.local_addr().unwrap()
    );

    axum::serve(listener, app(state)).await.unwrap();
}
