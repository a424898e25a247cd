//! Per-user conversation state storage trait.

use crate::StoreError;
use curator_types::{ConversationState, UserId};

pub trait ConversationStore: Send + Sync {
    /// The stored state, or [`ConversationState::Idle`] for unknown users.
    fn conversation(&self, user: UserId) -> Result<ConversationState, StoreError>;

    fn put_conversation(&self, user: UserId, state: ConversationState) -> Result<(), StoreError>;
}
