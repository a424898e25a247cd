use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] curator_store::StoreError),

    #[error("curation error: {0}")]
    Curation(#[from] curator_engine::CurationError),

    #[error("gateway error: {0}")]
    Gateway(#[from] curator_gateway::GatewayError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(#[from] curator_rpc::RpcError),

    #[error("shutdown timeout")]
    ShutdownTimeout,

    #[error("{0}")]
    Other(String),
}
