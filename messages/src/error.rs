use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    #[error("gateway refused delivery: {0}")]
    Rejected(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}
