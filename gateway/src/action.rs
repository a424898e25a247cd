//! Typed user intents resolved from raw gateway events.

use crate::links::{decode_referral, LinkParser};
use curator_messages::{parse_vote_callback, Inbound, Markup, Payload};
use curator_types::{ContentRef, Verdict, VoteId};

pub const BUTTON_DELEGATE: &str = "🐬 Delegate";
pub const BUTTON_STOP_DELEGATING: &str = "🦀 Stop";
pub const BUTTON_POWER: &str = "💪 Settings";
pub const BUTTON_INFORMATION: &str = "⚓️ Information";
pub const BUTTON_BECOME_CURATOR: &str = "Become a curator";
pub const BUTTON_STOP_CURATING: &str = "Stop curating";

/// Confirmation a user types after reading the curation rules.
pub const CURATOR_CONFIRMATION: &str = "I understand and still want to curate";

/// Persistent menu of the private chat.
pub fn main_menu() -> Markup {
    let row = |a: &str, b: &str| vec![a.to_string(), b.to_string()];
    Markup::Menu {
        rows: vec![
            row(BUTTON_DELEGATE, BUTTON_STOP_DELEGATING),
            row(BUTTON_POWER, BUTTON_INFORMATION),
            row(BUTTON_BECOME_CURATOR, BUTTON_STOP_CURATING),
        ],
    }
}

/// What a user asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// `/start`, optionally carrying the referrer account of an invitation link.
    Start { referral: Option<String> },
    Delegate,
    StopDelegating,
    ConfigurePower,
    Information,
    BecomeCurator,
    StopCurating,
    Submit(ContentRef),
    /// Text interpreted by the conversation state.
    FreeText(String),
    Verdict {
        callback_id: String,
        vote_id: VoteId,
        verdict: Verdict,
    },
}

impl Action {
    /// Resolve an event. Group chatter and unknown callbacks resolve to `None`.
    pub fn resolve(event: &Inbound, links: &LinkParser) -> Option<Self> {
        match &event.payload {
            Payload::Callback { id, data } => {
                let (vote_id, verdict) = parse_vote_callback(data)?;
                Some(Self::Verdict {
                    callback_id: id.clone(),
                    vote_id,
                    verdict,
                })
            }
            _ if !event.private => None,
            Payload::Command { name, args } => match name.as_str() {
                "start" => Some(Self::Start {
                    referral: decode_referral(args),
                }),
                _ => Some(Self::FreeText(format!("/{name}"))),
            },
            Payload::Text { text } => Some(Self::from_text(text, links)),
        }
    }

    fn from_text(text: &str, links: &LinkParser) -> Self {
        match text.trim() {
            BUTTON_DELEGATE => Self::Delegate,
            BUTTON_STOP_DELEGATING => Self::StopDelegating,
            BUTTON_POWER => Self::ConfigurePower,
            BUTTON_INFORMATION => Self::Information,
            BUTTON_BECOME_CURATOR => Self::BecomeCurator,
            BUTTON_STOP_CURATING => Self::StopCurating,
            other => match links.find(other) {
                Some(content) => Self::Submit(content),
                None => Self::FreeText(other.to_string()),
            },
        }
    }
}
