//! Axum-based HTTP server.

use crate::error::RpcError;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use curator_gateway::Gateway;
use prometheus::{IntCounter, Registry};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// State shared by every handler.
pub struct RpcState {
    pub gateway: Arc<Gateway>,
    /// Registry exposed at `/metrics`; `None` disables the endpoint.
    pub metrics_registry: Option<Registry>,
    pub events_received: IntCounter,
    pub events_failed: IntCounter,
    pub approvals_dispatched: TrackedCounter,
    pub started_at: Instant,
}

/// A Prometheus counter that follows a running total kept elsewhere.
///
/// Clones share the high-water mark, so concurrent observers never count
/// the same increment twice.
#[derive(Clone)]
pub struct TrackedCounter {
    counter: IntCounter,
    seen: Arc<AtomicU64>,
}

impl TrackedCounter {
    pub fn new(counter: IntCounter) -> Self {
        Self {
            counter,
            seen: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the counter to `total`. Totals at or below the last one are ignored.
    pub fn observe(&self, total: u64) {
        let previous = self.seen.fetch_max(total, Ordering::Relaxed);
        if total > previous {
            self.counter.inc_by(total - previous);
        }
    }

    pub fn get(&self) -> u64 {
        self.counter.get()
    }
}

pub type SharedState = Arc<RpcState>;

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/events", post(handlers::post_event))
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: SharedState,
}

impl RpcServer {
    pub fn with_state(addr: SocketAddr, state: SharedState) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until the task is dropped.
    pub async fn start(&self) -> Result<(), RpcError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        serve(listener, Arc::clone(&self.state)).await
    }
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<(), RpcError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "RPC server listening");
    }
    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_counter_only_moves_forward() {
        let counter = TrackedCounter::new(IntCounter::new("tracked_total", "tracked").unwrap());
        let clone = counter.clone();

        counter.observe(3);
        clone.observe(3);
        clone.observe(2);
        assert_eq!(counter.get(), 3);

        clone.observe(7);
        assert_eq!(counter.get(), 7);
    }
}
