//! Shutdown signaling
//!
//! One cooperative cancellation signal shared by the scanner tasks and the
//! REST server. Set once; every clone observes it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Cloneable, set-once shutdown flag that can also be awaited
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown
    pub fn request_shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// Check if shutdown was requested
    pub fn is_shutdown_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once shutdown has been requested (immediately if it already was)
    pub async fn requested(&self) {
        let mut rx = self.tx.subscribe();
        // sender lives as long as self, so this only returns on `true`
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for SIGINT / SIGTERM (Ctrl+C elsewhere), then request shutdown
pub async fn shutdown_on_os_signal(signal: ShutdownSignal) {
    let name = wait_for_os_signal().await;
    info!("Received {}, shutting down", name);
    signal.request_shutdown();
}

#[cfg(unix)]
async fn wait_for_os_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            tracing::warn!("Failed to register unix signal handlers, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return "Ctrl+C";
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shutdown_flag() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_shutdown_requested());

        let clone = signal.clone();
        clone.request_shutdown();

        assert!(signal.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_requested_wakes_waiters() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.requested().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        signal.request_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_requested_after_the_fact_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.request_shutdown();

        tokio::time::timeout(Duration::from_millis(100), signal.requested())
            .await
            .expect("already-set signal must not block");
    }
}
