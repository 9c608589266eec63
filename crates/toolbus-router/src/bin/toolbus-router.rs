use anyhow::Result;
use clap::Parser;
use toolbus_common::Error;
use toolbus_router::{server, RouterConfig};
use tracing::info;

/// toolbus command router
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.debug);

    let config = RouterConfig::from_env();
    info!(
        "starting command router on {}:{} (mock backends: {})",
        config.host, config.port, config.mock_backends
    );

    match server::run(config).await {
        // First process to bind wins; a later launch finding the port bound
        // means an instance is already serving, which is not a failure.
        Err(Error::PortInUse(port)) => {
            info!("port {} already bound - another router instance is running", port);
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(()) => Ok(()),
    }
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
