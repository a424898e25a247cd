//! Request handlers.

use crate::error::RpcError;
use crate::server::SharedState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use curator_gateway::Reply;
use curator_messages::Inbound;
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;

// ── Events ───────────────────────────────────────────────────────────────

/// `POST /events`: one chat event in, the replies out.
pub async fn post_event(
    State(state): State<SharedState>,
    Json(event): Json<Inbound>,
) -> Result<Json<Reply>, RpcError> {
    state.events_received.inc();
    match state.gateway.handle(event).await {
        Ok(reply) => {
            state
                .approvals_dispatched
                .observe(state.gateway.approvals_dispatched());
            Ok(Json(reply))
        }
        Err(e) => {
            state.events_failed.inc();
            tracing::warn!(error = %e, "event handling failed");
            Err(e.into())
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

// ── Metrics ──────────────────────────────────────────────────────────────

/// `GET /metrics` in the Prometheus text format, 404 when disabled.
pub async fn metrics(State(state): State<SharedState>) -> Result<impl IntoResponse, RpcError> {
    let Some(registry) = &state.metrics_registry else {
        return Ok((StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/plain")], String::new()));
    };
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| RpcError::Metrics(e.to_string()))?;
    let body = String::from_utf8(buffer).map_err(|e| RpcError::Metrics(e.to_string()))?;
    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
