//! Posts as the ledger reports them.

use curator_types::Asset;
use serde::{Deserialize, Serialize};

/// Where a post is in its payout lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutState {
    /// The payout window is still open.
    FirstPayout,
    SecondPayout,
    Archived,
    #[serde(other)]
    Unknown,
}

/// A post fetched from the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentInfo {
    pub author: String,
    #[serde(rename = "permlink")]
    pub permalink: String,
    #[serde(rename = "mode")]
    pub payout_state: PayoutState,
    pub max_accepted_payout: Asset,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: String,
}

impl ContentInfo {
    /// Whether the payout window is still pending.
    pub fn payout_pending(&self) -> bool {
        self.payout_state == PayoutState::FirstPayout
    }

    /// Whether the author disabled payouts for this post.
    pub fn payout_disabled(&self) -> bool {
        self.max_accepted_payout.is_zero()
    }

    /// Body length in characters.
    pub fn body_length(&self) -> usize {
        self.body.chars().count()
    }

    /// The first banned tag carried by this post, if any.
    pub fn banned_tag<'a>(&'a self, banned: &[String]) -> Option<&'a str> {
        self.tags
            .iter()
            .find(|tag| banned.iter().any(|b| b == *tag))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentInfo {
        serde_json::from_str(
            r#"{
                "author": "alice",
                "permlink": "post1",
                "mode": "first_payout",
                "max_accepted_payout": "1000000.000 GBG",
                "tags": ["life", "nsfw"],
                "body": "привет"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn deserializes_gateway_shape() {
        let content = sample();
        assert!(content.payout_pending());
        assert!(!content.payout_disabled());
        assert_eq!(content.body_length(), 6);
    }

    #[test]
    fn unknown_mode_is_not_pending() {
        let json = r#"{"author":"a","permlink":"p","mode":"frozen","max_accepted_payout":"0.000 GBG"}"#;
        let content: ContentInfo = serde_json::from_str(json).unwrap();
        assert_eq!(content.payout_state, PayoutState::Unknown);
        assert!(!content.payout_pending());
        assert!(content.payout_disabled());
    }

    #[test]
    fn finds_banned_tag() {
        let content = sample();
        assert_eq!(content.banned_tag(&["nsfw".to_string()]), Some("nsfw"));
        assert_eq!(content.banned_tag(&["spam".to_string()]), None);
    }
}
