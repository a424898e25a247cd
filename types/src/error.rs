//! Parse and validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("power must be between 1 and 100 percent, got {0}")]
    PowerOutOfRange(i64),

    #[error("invalid asset amount: {0}")]
    InvalidAsset(String),

    #[error("invalid vote state: {0}")]
    InvalidVoteState(String),

    #[error("invalid conversation state: {0}")]
    InvalidConversationState(String),

    #[error("invalid event kind: {0}")]
    InvalidEventKind(String),

    #[error("empty content reference")]
    EmptyContentRef,
}
