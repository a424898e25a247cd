//! Curator reputation.
//!
//! Ratings never change on their own: a resolution collects its adjustments in
//! [`RatingChanges`] and [`RatingLedger::commit`] writes them in the same store
//! step as the vote's terminal transition. A vote that is resolved twice
//! therefore cannot move ratings twice.

use curator_store::{CredentialStore, RatingChange, SharedStore, StoreError, VoteStore};
use curator_types::{UserId, VoteId, VoteState};

/// Rating adjustments pending on one resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RatingChanges {
    changes: Vec<RatingChange>,
}

impl RatingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, user: UserId, delta: i64) -> &mut Self {
        self.push(user, delta)
    }

    pub fn decrement(&mut self, user: UserId, delta: i64) -> &mut Self {
        self.push(user, -delta)
    }

    /// Net adjustment recorded for `user`.
    pub fn net(&self, user: UserId) -> i64 {
        self.changes
            .iter()
            .filter(|c| c.user == user)
            .map(|c| c.delta)
            .sum()
    }

    pub fn as_slice(&self) -> &[RatingChange] {
        &self.changes
    }

    fn push(&mut self, user: UserId, delta: i64) -> &mut Self {
        match self.changes.iter_mut().find(|c| c.user == user) {
            Some(existing) => existing.delta += delta,
            None => self.changes.push(RatingChange { user, delta }),
        }
        self
    }
}

/// Read and commit curator ratings.
pub struct RatingLedger {
    store: SharedStore,
}

impl RatingLedger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Current score, `None` for users without a credential.
    pub fn rating(&self, user: UserId) -> Result<Option<i64>, StoreError> {
        self.store.rating(user)
    }

    /// Move `vote` out of `Open` and apply `changes` atomically.
    ///
    /// Returns false, with nothing applied, when the vote was already terminal.
    pub fn commit(
        &self,
        vote: VoteId,
        to: VoteState,
        changes: &RatingChanges,
    ) -> Result<bool, StoreError> {
        let applied = self.store.resolve(vote, to, changes.as_slice())?;
        if applied {
            tracing::debug!(%vote, state = to.as_str(), changes = changes.changes.len(), "ratings committed");
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_nullables::NullStore;
    use curator_store::NewVote;
    use curator_types::{ChatId, ContentRef, Credential, Timestamp};
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn merges_changes_per_user() {
        let mut changes = RatingChanges::new();
        changes
            .decrement(UserId::new(1), 6)
            .increment(UserId::new(2), 1)
            .increment(UserId::new(1), 1);
        assert_eq!(changes.net(UserId::new(1)), -5);
        assert_eq!(changes.as_slice().len(), 2);
    }

    #[test]
    fn second_commit_applies_nothing() {
        let store = Arc::new(NullStore::new());
        store
            .put_credential(&Credential::activated(UserId::new(1), ChatId::new(1), "alice"))
            .unwrap();
        let vote = store
            .insert_vote(&NewVote {
                content: ContentRef::new("bob", "p").unwrap(),
                submitter: UserId::new(1),
                submitted_at: Timestamp::new(1),
                percent: 100,
            })
            .unwrap();
        let ledger = RatingLedger::new(store.clone());
        let mut changes = RatingChanges::new();
        changes.increment(UserId::new(1), 1);

        assert!(ledger.commit(vote.id, VoteState::Completed, &changes).unwrap());
        assert!(!ledger.commit(vote.id, VoteState::Completed, &changes).unwrap());
        assert_eq!(ledger.rating(UserId::new(1)).unwrap(), Some(1));
    }

    proptest! {
        #[test]
        fn net_is_sum_of_deltas(deltas in proptest::collection::vec((0i64..4, -50i64..50), 0..40)) {
            let mut changes = RatingChanges::new();
            for (user, delta) in &deltas {
                changes.increment(UserId::new(*user), *delta);
            }
            for user in 0..4 {
                let expected: i64 = deltas.iter().filter(|(u, _)| *u == user).map(|(_, d)| d).sum();
                prop_assert_eq!(changes.net(UserId::new(user)), expected);
            }
        }
    }
}
