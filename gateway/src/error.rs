use curator_engine::CurationError;
use curator_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("curation error: {0}")]
    Curation(#[from] CurationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid frontend domain pattern: {0}")]
    InvalidDomain(String),
}
