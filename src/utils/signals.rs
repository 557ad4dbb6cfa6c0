//! Signal handling for graceful shutdown

use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::{info, warn};

/// Wait for a shutdown signal (SIGTERM, SIGINT).
///
/// Falls back to Ctrl-C alone if the signal stream cannot be registered.
pub async fn shutdown_signal() {
    let signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ]);

    match signals {
        Ok(mut signals) => {
            if let Some(signal) = signals.next().await {
                info!("Received signal: {}", signal);
            }
        }
        Err(e) => {
            warn!("Failed to register signal handler: {}, waiting for Ctrl-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to wait for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}
