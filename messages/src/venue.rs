//! Side effects on the chat platform.

use crate::error::MessageError;
use crate::outbound::Outbound;
use async_trait::async_trait;
use curator_types::UserId;
use std::sync::Arc;

/// The curation group and the private chats the service talks to.
#[async_trait]
pub trait Venue: Send + Sync {
    /// Deliver a message to one chat.
    async fn send(&self, message: Outbound) -> Result<(), MessageError>;

    /// Post a message to the curation group.
    async fn announce(&self, text: &str) -> Result<(), MessageError>;

    /// Answer an inline button press.
    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), MessageError>;

    /// Remove a user from the curation group.
    async fn remove_member(&self, user: UserId) -> Result<(), MessageError>;
}

pub type SharedVenue = Arc<dyn Venue>;
