//! Vote storage trait.

use crate::StoreError;
use curator_types::{ContentRef, Timestamp, UserId, Vote, VoteId, VoteState};
use serde::{Deserialize, Serialize};

/// A vote about to be opened. The store assigns the identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewVote {
    pub content: ContentRef,
    pub submitter: UserId,
    pub submitted_at: Timestamp,
    pub percent: u8,
}

/// A rating adjustment committed together with a vote resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub user: UserId,
    pub delta: i64,
}

/// Trait for vote storage operations.
pub trait VoteStore: Send + Sync {
    /// Insert a new vote in state `Open`.
    ///
    /// Fails with [`StoreError::Duplicate`] if any vote, in any state, already
    /// references the same content.
    fn insert_vote(&self, vote: &NewVote) -> Result<Vote, StoreError>;

    fn get_vote(&self, id: VoteId) -> Result<Vote, StoreError>;

    /// Whether any vote, in any state, references this content.
    fn content_exists(&self, content: &ContentRef) -> Result<bool, StoreError>;

    /// The most recent submission of a user.
    fn last_vote_by(&self, submitter: UserId) -> Result<Option<Vote>, StoreError>;

    /// The user's latest resolved votes, newest first.
    fn recent_resolved_by(&self, submitter: UserId, limit: usize) -> Result<Vec<Vote>, StoreError>;

    fn open_vote_count(&self) -> Result<u64, StoreError>;

    fn open_votes(&self) -> Result<Vec<Vote>, StoreError>;

    /// The open vote with the earliest submission time.
    fn oldest_open_vote(&self) -> Result<Option<Vote>, StoreError>;

    /// Votes in `state` submitted at or after `since`, oldest first.
    fn votes_in_state_since(
        &self,
        state: VoteState,
        since: Timestamp,
    ) -> Result<Vec<Vote>, StoreError>;

    /// Atomically move a vote from `Open` to the terminal state `to` and apply
    /// `ratings` to the affected credentials in the same step.
    ///
    /// Returns `Ok(true)` only for the single call that performed the
    /// transition; every later call returns `Ok(false)` and changes nothing.
    /// Ratings of users without a credential are skipped.
    fn resolve(
        &self,
        id: VoteId,
        to: VoteState,
        ratings: &[RatingChange],
    ) -> Result<bool, StoreError>;
}
