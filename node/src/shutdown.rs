//! Graceful shutdown controller for the curation node.
//!
//! Listens for SIGINT/SIGTERM and broadcasts a shutdown signal to the
//! periodic loops via a `tokio::sync::broadcast` channel. In-flight dispatch
//! batches watch a separate `watch` flag that flips to `true` at the same
//! moment.

use tokio::signal;
use tokio::sync::{broadcast, watch};

/// Coordinates graceful shutdown across all node subsystems.
///
/// Loops call [`subscribe`](Self::subscribe) to get a receiver, then
/// `select!` on it alongside their tick. When shutdown is triggered (either
/// by OS signal or programmatically), every receiver is notified.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
    cancel: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        let (cancel, _) = watch::channel(false);
        Self { tx, cancel }
    }

    /// Get a receiver that will be notified on shutdown.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Get a flag that turns `true` on shutdown.
    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.cancel.send_replace(true);
        let _ = self.tx.send(());
    }

    /// Wait for SIGTERM or SIGINT, or a programmatic shutdown, then make
    /// sure every subscriber has been told.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();
        let mut programmatic = self.tx.subscribe();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::warn!("failed to install SIGTERM handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
            _ = programmatic.recv() => { tracing::info!("shutdown requested"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
