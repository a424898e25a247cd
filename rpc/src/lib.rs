//! HTTP surface of the curation service.
//!
//! - `POST /events`: an inbound chat event, answered with the gateway reply
//! - `GET /health`: liveness and uptime
//! - `GET /metrics`: Prometheus exposition of the node metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{create_router, serve, RpcServer, RpcState, SharedState, TrackedCounter};
