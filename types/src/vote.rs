//! Votes under curation, curator responses and their tally.

use crate::content::ContentRef;
use crate::error::TypesError;
use crate::ids::{UserId, VoteId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The lifecycle state of a vote.
///
/// `Open` is the only non-terminal state. A vote leaves `Open` exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteState {
    /// Waiting for curator responses.
    Open,
    /// Accepted by the curators (or screened out by the integrity check).
    Completed,
    /// Rejected by the curators. Ties land here.
    Rejected,
    /// The payout window closed before the vote was accepted.
    Addled,
}

impl VoteState {
    /// Whether the vote has left `Open`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Addled => "addled",
        }
    }
}

impl FromStr for VoteState {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "addled" => Ok(Self::Addled),
            other => Err(TypesError::InvalidVoteState(other.to_string())),
        }
    }
}

/// A content item under curation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub content: ContentRef,
    /// The user who proposed the content.
    pub submitter: UserId,
    pub submitted_at: Timestamp,
    /// Weight percent applied to the collective action.
    pub percent: u8,
    pub state: VoteState,
}

impl Vote {
    /// The terminal flag: true once the vote has been resolved in any way.
    pub fn completed(&self) -> bool {
        self.state.is_terminal()
    }
}

/// A curator's verdict on a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Approve,
    Reject,
}

impl Verdict {
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Approve)
    }

    pub fn from_positive(positive: bool) -> Self {
        if positive {
            Self::Approve
        } else {
            Self::Reject
        }
    }
}

/// One curator's response to a vote. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub vote_id: VoteId,
    pub voter: UserId,
    pub verdict: Verdict,
    pub responded_at: Timestamp,
}

/// Positive and negative response counts for a vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub positives: u32,
    pub negatives: u32,
}

impl Tally {
    pub fn new(positives: u32, negatives: u32) -> Self {
        Self {
            positives,
            negatives,
        }
    }

    /// Build a tally from a list of verdicts.
    pub fn from_verdicts<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        verdicts.into_iter().fold(Self::default(), |mut tally, v| {
            match v {
                Verdict::Approve => tally.positives += 1,
                Verdict::Reject => tally.negatives += 1,
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.positives + self.negatives
    }

    /// `positives - negatives`, signed.
    pub fn margin(&self) -> i64 {
        i64::from(self.positives) - i64::from(self.negatives)
    }

    pub fn meets_quorum(&self, required: u32) -> bool {
        self.total() >= required
    }

    /// Strict positive majority. A tie is not acceptance.
    pub fn is_accepted(&self) -> bool {
        self.positives > self.negatives
    }
}
