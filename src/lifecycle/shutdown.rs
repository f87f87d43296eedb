//! Shutdown coordination for the proxy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Carries the process-wide run flag and a broadcast channel that all
/// long-running tasks can subscribe to. Triggering flips the flag and
/// wakes every subscriber; in-flight work runs to completion.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    running: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// Whether the run flag is still set.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_clears_flag_and_wakes_subscribers() {
        let shutdown = Shutdown::new();
        assert!(shutdown.is_running());

        let mut rx = shutdown.subscribe();
        shutdown.trigger();

        assert!(!shutdown.is_running());
        assert!(rx.recv().await.is_ok());
    }
}
