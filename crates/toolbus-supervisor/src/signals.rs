//! Shutdown-signal wiring.

use tracing::info;

/// Resolve when the process receives an interrupt/terminate signal.
///
/// The launcher awaits this and then calls [`Supervisor::shutdown_all`], and
/// calls it again on the normal exit path; idempotent shutdown makes both
/// safe, so a Ctrl-C never leaves orphaned children.
///
/// [`Supervisor::shutdown_all`]: crate::Supervisor::shutdown_all
pub async fn wait_for_shutdown_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to create SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to create SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
