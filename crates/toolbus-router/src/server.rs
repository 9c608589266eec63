//! Router server entry point.

use crate::config::RouterConfig;
use crate::dispatch::RouterState;
use crate::routes::create_router;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::net::TcpListener;
use toolbus_common::{Error, Result};
use tracing::info;

/// Bind the configured address and serve until the process exits.
///
/// An already-bound port means another router instance owns it; that case is
/// reported as [`Error::PortInUse`] so the caller can treat it as "reuse the
/// running instance" rather than a failure.
pub async fn run(config: RouterConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let port = config.port;

    let state = Arc::new(RouterState::new(config));
    let app = create_router(state);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            return Err(Error::PortInUse(port));
        }
        Err(e) => return Err(e.into()),
    };

    info!("command router listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Internal(e.to_string()))
}
