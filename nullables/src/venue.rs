//! Nullable venue: record chat side effects without sending them.

use async_trait::async_trait;
use curator_messages::{MessageError, Outbound, Venue};
use curator_types::UserId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A test venue that records messages instead of sending them.
#[derive(Default)]
pub struct NullVenue {
    sent: Mutex<Vec<Outbound>>,
    announcements: Mutex<Vec<String>>,
    callback_answers: Mutex<Vec<(String, String)>>,
    removed: Mutex<Vec<UserId>>,
    failing: AtomicBool,
}

impl NullVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a delivery error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All direct messages "sent" (for assertions).
    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap().clone()
    }

    pub fn announcements(&self) -> Vec<String> {
        self.announcements.lock().unwrap().clone()
    }

    pub fn callback_answers(&self) -> Vec<(String, String)> {
        self.callback_answers.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<UserId> {
        self.removed.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), MessageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessageError::Unreachable("null venue offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Venue for NullVenue {
    async fn send(&self, message: Outbound) -> Result<(), MessageError> {
        self.check()?;
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn announce(&self, text: &str) -> Result<(), MessageError> {
        self.check()?;
        self.announcements.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), MessageError> {
        self.check()?;
        self.callback_answers
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn remove_member(&self, user: UserId) -> Result<(), MessageError> {
        self.check()?;
        self.removed.lock().unwrap().push(user);
        Ok(())
    }
}
