//! toolbus launcher.
//!
//! Brings up the command router and the configured backend processes under
//! one supervisor, gates startup on readiness probes, and guarantees that an
//! interrupt or a normal exit tears everything down again.

mod config;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use config::{BackendConfig, LauncherConfig};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use toolbus_probe::{ReadinessProbe, RetryBudget};
use toolbus_supervisor::{wait_for_shutdown_signal, LaunchSpec, Supervisor};
use tracing::{error, info, warn};

/// toolbus system launcher
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Which components to launch
    #[arg(value_enum, default_value_t = Mode::All)]
    mode: Mode,

    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Force mock backend behavior in the router
    #[arg(long)]
    mock: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

/// Launch mode, mirroring the workflows the old per-combination scripts
/// covered.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Router plus every enabled backend
    All,
    /// Router only
    Router,
    /// Router plus the asset-authoring backend
    Asset,
    /// Router plus the engine backend
    Engine,
}

impl Mode {
    fn includes(&self, backend_id: &str) -> bool {
        match self {
            Mode::All => true,
            Mode::Router => false,
            Mode::Asset => backend_id == "asset",
            Mode::Engine => backend_id == "engine",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.debug);

    let mut config = match &args.config {
        Some(path) => LauncherConfig::load_from_file(path)?,
        None => LauncherConfig::default(),
    };
    if args.mock {
        config.router.mock_backends = true;
    }

    print_system_info(&config);

    let supervisor = Supervisor::new();
    let cancel = CancellationToken::new();
    let budget = RetryBudget::new(config.readiness.max_attempts, config.readiness.interval);

    start_router(&supervisor, &config, &budget, &cancel).await?;

    for backend in config
        .backends
        .iter()
        .filter(|b| b.enabled && args.mode.includes(&b.id))
    {
        start_backend(&supervisor, backend, &budget, &cancel).await?;
    }

    info!("toolbus is up (mode: {:?}); press Ctrl-C to stop", args.mode);
    wait_for_shutdown_signal().await;

    supervisor.shutdown_all(&cancel).await;
    info!("all supervised processes stopped");
    Ok(())
}

/// Launch the router, or reuse one that already owns the port.
async fn start_router(
    supervisor: &Supervisor,
    config: &LauncherConfig,
    budget: &RetryBudget,
    cancel: &CancellationToken,
) -> Result<()> {
    let router_url = config.router_base_url();

    // First process to bind the port wins; if something is already serving
    // there, use it instead of double-launching.
    let quick_check = RetryBudget::new(1, Duration::from_millis(100));
    if ReadinessProbe::default()
        .wait_until_ready(&router_url, &quick_check, cancel)
        .await
    {
        info!("router already running at {}, reusing it", router_url);
        return Ok(());
    }

    let mut spec = LaunchSpec::new("router", &config.router.executable_path)
        .with_args(config.router.args.clone())
        .with_env("TOOLBUS_ROUTER_HOST", &config.router.host)
        .with_env("TOOLBUS_ROUTER_PORT", config.router.port.to_string());
    if config.router.mock_backends {
        spec = spec.with_env("TOOLBUS_MOCK_BACKENDS", "true");
        info!("mock mode enabled: backend responses will be simulated");
    }

    let record = supervisor.launch(&spec).await?;
    let ready = supervisor
        .await_ready(record.launch_id, &router_url, budget, cancel)
        .await?;
    if !ready {
        error!("router did not become ready at {}", router_url);
        supervisor.shutdown_all(cancel).await;
        anyhow::bail!("router failed to start");
    }
    Ok(())
}

/// Launch one backend. Optional backends degrade to warnings; required ones
/// take the whole launch down.
async fn start_backend(
    supervisor: &Supervisor,
    backend: &BackendConfig,
    budget: &RetryBudget,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut spec = LaunchSpec::new(&backend.id, &backend.executable_path)
        .with_args(backend.args.clone());
    for (key, value) in &backend.environment {
        spec = spec.with_env(key, value);
    }
    if let Some(dir) = &backend.working_directory {
        spec = spec.with_working_directory(dir);
    }

    let record = match supervisor.launch(&spec).await {
        Ok(record) => record,
        Err(e) if backend.optional => {
            warn!("failed to launch optional backend {}: {}", backend.id, e);
            return Ok(());
        }
        Err(e) => {
            error!("failed to launch required backend {}: {}", backend.id, e);
            supervisor.shutdown_all(cancel).await;
            return Err(e.into());
        }
    };

    let ready = supervisor
        .await_ready(record.launch_id, &backend.status_url, budget, cancel)
        .await?;
    if !ready {
        warn!(
            "{} backend is not ready yet, continuing in degraded mode",
            backend.id
        );
    }
    Ok(())
}

fn print_system_info(config: &LauncherConfig) {
    info!("=== toolbus system ===");
    info!("router: {}", config.router_base_url());
    for backend in &config.backends {
        if backend.enabled {
            info!(
                "{} backend: {} (status: {})",
                backend.id, backend.executable_path, backend.status_url
            );
        } else {
            info!("{} backend: disabled", backend.id);
        }
    }
    let key_configured = std::env::var("OPENAI_API_KEY")
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);
    if key_configured {
        info!("generative provider: API key configured");
    } else {
        info!("generative provider: no API key, fallback content will be served");
    }
    info!("======================");
}

fn initialize_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_filtering() {
        assert!(Mode::All.includes("asset"));
        assert!(Mode::All.includes("engine"));
        assert!(!Mode::Router.includes("asset"));
        assert!(Mode::Asset.includes("asset"));
        assert!(!Mode::Asset.includes("engine"));
        assert!(Mode::Engine.includes("engine"));
        assert!(!Mode::Engine.includes("asset"));
    }
}
