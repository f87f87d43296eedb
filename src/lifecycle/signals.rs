//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - One signal means graceful shutdown; there is no reload signal since
//!   configuration is immutable after startup

use crate::lifecycle::Shutdown;

/// Trigger shutdown when Ctrl+C arrives.
pub fn trigger_on_ctrl_c(shutdown: Shutdown) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown signal received");
                shutdown.trigger();
            }
            Err(error) => {
                tracing::error!(%error, "failed to install Ctrl+C handler");
            }
        }
    });
}
