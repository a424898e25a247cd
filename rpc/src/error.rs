//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use curator_gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("metrics encoding failed: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Server(String),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match self {
            RpcError::Gateway(GatewayError::InvalidDomain(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
