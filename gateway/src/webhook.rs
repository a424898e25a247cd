//! Venue that forwards side effects to the chat gateway over HTTP.
//!
//! | path | body |
//! |---|---|
//! | `POST /send` | [`Outbound`] |
//! | `POST /announce` | `{text}` |
//! | `POST /answer` | `{callback_id, text}` |
//! | `POST /remove` | `{user_id}` |

use async_trait::async_trait;
use curator_messages::{MessageError, Outbound, Venue};
use curator_types::UserId;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Default timeout for one delivery.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WebhookVenue {
    base_url: String,
    http_client: reqwest::Client,
}

impl WebhookVenue {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), MessageError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MessageError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    MessageError::Unreachable(format!("connection failed: {e}"))
                } else if e.is_builder() || e.is_body() {
                    MessageError::Encoding(e.to_string())
                } else {
                    MessageError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(MessageError::Rejected(format!(
                "HTTP status {} from {path}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Venue for WebhookVenue {
    async fn send(&self, message: Outbound) -> Result<(), MessageError> {
        self.post("send", &message).await
    }

    async fn announce(&self, text: &str) -> Result<(), MessageError> {
        self.post("announce", &json!({ "text": text })).await
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), MessageError> {
        self.post("answer", &json!({ "callback_id": callback_id, "text": text }))
            .await
    }

    async fn remove_member(&self, user: UserId) -> Result<(), MessageError> {
        self.post("remove", &json!({ "user_id": user })).await
    }
}
