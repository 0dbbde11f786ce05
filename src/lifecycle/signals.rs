//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM (Ctrl+C on non-unix platforms)
//! - Translate the first signal into `Server::stop`
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Stop only closes the listener; in-flight handshakes drain on their own

use std::sync::Arc;

use crate::server::Server;

/// Resolve when the process receives a termination signal.
pub async fn termination() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
    }
}

/// Stop `server` on the first termination signal.
pub fn stop_on_signal(server: Arc<Server>) {
    tokio::spawn(async move {
        match termination().await {
            Ok(signal) => {
                tracing::info!(signal, "Shutdown signal received");
                server.stop();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install signal handler"),
        }
    });
}
