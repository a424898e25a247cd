//! Curator response storage trait.

use crate::StoreError;
use curator_types::{Response, Tally, Timestamp, UserId, VoteId};

/// Trait for response storage operations.
pub trait ResponseStore: Send + Sync {
    /// Insert a response unless one already exists for (vote, voter).
    ///
    /// Returns `Ok(false)` without writing when the pair is already present.
    fn insert_response(&self, response: &Response) -> Result<bool, StoreError>;

    fn get_response(&self, vote: VoteId, voter: UserId) -> Result<Option<Response>, StoreError>;

    fn responses_for(&self, vote: VoteId) -> Result<Vec<Response>, StoreError>;

    /// Positive and negative counts for a vote.
    fn tally(&self, vote: VoteId) -> Result<Tally, StoreError> {
        let responses = self.responses_for(vote)?;
        Ok(Tally::from_verdicts(responses.iter().map(|r| &r.verdict)))
    }

    /// Number of responses per voter at or after `since`.
    fn response_counts_since(&self, since: Timestamp) -> Result<Vec<(UserId, u64)>, StoreError>;
}
