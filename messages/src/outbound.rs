//! Replies sent back through the gateway.

use curator_types::{ChatId, Verdict, VoteId};
use serde::{Deserialize, Serialize};

const APPROVE_SUFFIX: &str = "good";
const REJECT_SUFFIX: &str = "bad";

/// A message for one chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<Markup>,
}

impl Outbound {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = Some(markup);
        self
    }
}

/// An inline button carrying callback data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub data: String,
}

/// Keyboard attached to an outbound message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Markup {
    /// Inline buttons under the message.
    Inline { buttons: Vec<Button> },
    /// Persistent reply keyboard of text buttons.
    Menu { rows: Vec<Vec<String>> },
}

impl Markup {
    /// Approve / reject buttons for a vote, keyed `"<id>_good"` and `"<id>_bad"`.
    pub fn vote(vote_id: VoteId) -> Self {
        Markup::Inline {
            buttons: vec![
                Button {
                    text: "👍".to_string(),
                    data: format!("{vote_id}_{APPROVE_SUFFIX}"),
                },
                Button {
                    text: "👎".to_string(),
                    data: format!("{vote_id}_{REJECT_SUFFIX}"),
                },
            ],
        }
    }
}

/// Decode vote callback data produced by [`Markup::vote`].
pub fn parse_vote_callback(data: &str) -> Option<(VoteId, Verdict)> {
    let (id, action) = data.split_once('_')?;
    let id: i64 = id.parse().ok()?;
    let verdict = match action {
        APPROVE_SUFFIX => Verdict::Approve,
        REJECT_SUFFIX => Verdict::Reject,
        _ => return None,
    };
    Some((VoteId::new(id), verdict))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_markup_round_trips_through_callback_data() {
        let Markup::Inline { buttons } = Markup::vote(VoteId::new(42)) else {
            panic!("expected inline markup");
        };
        assert_eq!(buttons[0].data, "42_good");
        assert_eq!(
            parse_vote_callback(&buttons[0].data),
            Some((VoteId::new(42), Verdict::Approve))
        );
        assert_eq!(
            parse_vote_callback(&buttons[1].data),
            Some((VoteId::new(42), Verdict::Reject))
        );
    }

    #[test]
    fn rejects_malformed_callback_data() {
        assert_eq!(parse_vote_callback("42"), None);
        assert_eq!(parse_vote_callback("x_good"), None);
        assert_eq!(parse_vote_callback("42_maybe"), None);
    }

    #[test]
    fn omits_missing_markup() {
        let json = serde_json::to_string(&Outbound::new(ChatId::new(1), "hi")).unwrap();
        assert_eq!(json, r#"{"chat_id":1,"text":"hi"}"#);
    }
}
