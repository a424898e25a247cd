//! Events delivered by the gateway.

use curator_types::{ChatId, UserId};
use serde::{Deserialize, Serialize};

/// One event from the chat platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub user_id: UserId,
    /// Whether the event came from a private chat with the service.
    #[serde(default = "default_private")]
    pub private: bool,
    #[serde(default)]
    pub first_name: Option<String>,
    pub payload: Payload,
}

fn default_private() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Text {
        text: String,
    },
    /// A slash command, without the slash.
    Command {
        name: String,
        #[serde(default)]
        args: String,
    },
    /// An inline button press.
    Callback {
        id: String,
        data: String,
    },
}

impl Inbound {
    pub fn text(chat_id: ChatId, user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            private: true,
            first_name: None,
            payload: Payload::Text { text: text.into() },
        }
    }

    pub fn command(chat_id: ChatId, user_id: UserId, name: &str, args: &str) -> Self {
        Self {
            chat_id,
            user_id,
            private: true,
            first_name: None,
            payload: Payload::Command {
                name: name.to_string(),
                args: args.to_string(),
            },
        }
    }

    pub fn callback(chat_id: ChatId, user_id: UserId, id: &str, data: &str) -> Self {
        Self {
            chat_id,
            user_id,
            private: true,
            first_name: None,
            payload: Payload::Callback {
                id: id.to_string(),
                data: data.to_string(),
            },
        }
    }
}
