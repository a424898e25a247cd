use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("ledger request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error("ledger rejected the call ({code}): {message}")]
    Rpc { code: i64, message: String },

    #[error("not found on ledger: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LedgerError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            LedgerError::Unreachable(format!("connection failed: {e}"))
        } else {
            LedgerError::RequestFailed(e.to_string())
        }
    }
}
