//! Intake of new posts.

use crate::eligibility::{community_rejection, content_rejection};
use crate::error::{CurationError, Rejection};
use curator_ledger::{ContentInfo, LedgerError, SharedLedger};
use curator_store::{CredentialStore, NewVote, SharedStore, StoreError, VoteStore};
use curator_types::{
    ContentRef, CurationParams, Tally, Timestamp, UserId, Vote, VoteState,
};
use std::sync::Arc;

/// Weight percent of every opened vote.
const FULL_PERCENT: u8 = 100;

/// Result of a submission attempt.
#[derive(Clone, Debug)]
pub enum SubmitOutcome {
    /// The vote is open. `content` is the post as fetched during validation.
    Opened {
        vote: Vote,
        tally: Tally,
        content: ContentInfo,
    },
    Rejected(Rejection),
}

/// Submitter cooldown in seconds.
///
/// The base interval is scaled by `2 - accepted/resolved` over the submitter's
/// recent resolved votes: a clean history waits the base interval, a fully
/// rejected one waits twice as long. Without history the factor is 1.
pub fn cooldown_interval(base_secs: u64, history: &[Vote]) -> u64 {
    if history.is_empty() {
        return base_secs;
    }
    let accepted = history
        .iter()
        .filter(|v| v.state == VoteState::Completed)
        .count();
    let factor = 2.0 - accepted as f64 / history.len() as f64;
    (base_secs as f64 * factor).round() as u64
}

/// Validates submissions and opens votes.
pub struct SubmissionGate {
    store: SharedStore,
    ledger: SharedLedger,
    params: Arc<CurationParams>,
}

impl SubmissionGate {
    pub fn new(store: SharedStore, ledger: SharedLedger, params: Arc<CurationParams>) -> Self {
        Self {
            store,
            ledger,
            params,
        }
    }

    /// Cooldown the submitter currently has to wait between submissions.
    pub fn cooldown_for(&self, submitter: UserId) -> Result<u64, StoreError> {
        let history = self
            .store
            .recent_resolved_by(submitter, self.params.history_window as usize)?;
        Ok(cooldown_interval(self.params.posting_interval_secs, &history))
    }

    /// Validate `content` and open a vote for it.
    ///
    /// A rejection writes nothing.
    pub async fn submit(
        &self,
        content: ContentRef,
        submitter: UserId,
        now: Timestamp,
    ) -> Result<SubmitOutcome, CurationError> {
        if self.store.content_exists(&content)? {
            return Ok(SubmitOutcome::Rejected(Rejection::AlreadySubmitted));
        }

        if let Some(last) = self.store.last_vote_by(submitter)? {
            let interval = self.cooldown_for(submitter)?;
            let elapsed = last.submitted_at.elapsed_since(now);
            if elapsed < interval {
                return Ok(SubmitOutcome::Rejected(Rejection::Cooldown {
                    remaining_secs: interval - elapsed,
                }));
            }
        }

        if self.store.open_vote_count()? >= u64::from(self.params.max_open_votes) {
            return Ok(SubmitOutcome::Rejected(Rejection::TooManyOpenVotes));
        }

        let info = match self
            .ledger
            .get_content(&content.author, &content.permalink)
            .await
        {
            Ok(info) => info,
            Err(LedgerError::NotFound(_)) => {
                return Ok(SubmitOutcome::Rejected(Rejection::ContentNotFound))
            }
            Err(e) => return Err(e.into()),
        };
        if info.author != content.author || info.permalink != content.permalink {
            return Ok(SubmitOutcome::Rejected(Rejection::ContentNotFound));
        }
        if let Some(rejection) = content_rejection(&info, &self.params) {
            return Ok(SubmitOutcome::Rejected(rejection));
        }
        let active = self
            .store
            .get_credential(submitter)?
            .is_some_and(|c| c.active);
        if !active {
            return Ok(SubmitOutcome::Rejected(Rejection::NotActive));
        }
        if let Some(rejection) = community_rejection(&content.author, &self.params) {
            return Ok(SubmitOutcome::Rejected(rejection));
        }

        let new_vote = NewVote {
            content,
            submitter,
            submitted_at: now,
            percent: FULL_PERCENT,
        };
        let vote = match self.store.insert_vote(&new_vote) {
            Ok(vote) => vote,
            Err(StoreError::Duplicate(_)) => {
                return Ok(SubmitOutcome::Rejected(Rejection::AlreadySubmitted))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(vote = %vote.id, content = %vote.content, %submitter, "vote opened");

        Ok(SubmitOutcome::Opened {
            vote,
            tally: Tally::default(),
            content: info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_nullables::{NullLedger, NullStore};
    use curator_types::{ChatId, Credential, VoteId};
    use proptest::prelude::*;

    const NOW: u64 = 1_000_000;

    struct Fixture {
        store: Arc<NullStore>,
        ledger: Arc<NullLedger>,
        gate: SubmissionGate,
    }

    fn fixture(params: CurationParams) -> Fixture {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        store
            .put_credential(&Credential::activated(UserId::new(1), ChatId::new(1), "alice"))
            .unwrap();
        let gate = SubmissionGate::new(store.clone(), ledger.clone(), Arc::new(params));
        Fixture {
            store,
            ledger,
            gate,
        }
    }

    fn post(author: &str, permalink: &str) -> ContentRef {
        ContentRef::new(author, permalink).unwrap()
    }

    fn vote_in(state: VoteState) -> Vote {
        Vote {
            id: VoteId::new(1),
            content: post("a", "p"),
            submitter: UserId::new(1),
            submitted_at: Timestamp::new(0),
            percent: 100,
            state,
        }
    }

    #[tokio::test]
    async fn opens_vote_with_zero_tally() {
        let f = fixture(CurationParams::default());
        f.ledger.put_content(NullLedger::fresh_content("bob", "post1", 300));

        let outcome = f
            .gate
            .submit(post("bob", "post1"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();

        let SubmitOutcome::Opened { vote, tally, .. } = outcome else {
            panic!("expected an opened vote, got {outcome:?}");
        };
        assert_eq!(vote.state, VoteState::Open);
        assert_eq!(vote.percent, 100);
        assert_eq!(tally, Tally::default());
    }

    #[tokio::test]
    async fn same_content_twice_keeps_one_vote() {
        let params = CurationParams {
            posting_interval_secs: 0,
            ..CurationParams::default()
        };
        let f = fixture(params);
        f.ledger.put_content(NullLedger::fresh_content("alice", "post1", 300));

        let first = f
            .gate
            .submit(post("alice", "post1"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(first, SubmitOutcome::Opened { .. }));

        let second = f
            .gate
            .submit(post("alice", "post1"), UserId::new(1), Timestamp::new(NOW + 10))
            .await
            .unwrap();
        assert!(matches!(
            second,
            SubmitOutcome::Rejected(Rejection::AlreadySubmitted)
        ));
        assert_eq!(f.store.vote_count(), 1);
    }

    #[tokio::test]
    async fn cooldown_blocks_quick_resubmission() {
        let f = fixture(CurationParams::default());
        f.ledger.put_content(NullLedger::fresh_content("bob", "a", 300));
        f.ledger.put_content(NullLedger::fresh_content("bob", "b", 300));

        f.gate
            .submit(post("bob", "a"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        let outcome = f
            .gate
            .submit(post("bob", "b"), UserId::new(1), Timestamp::new(NOW + 600))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(Rejection::Cooldown { remaining_secs: 3000 })
        ));

        let outcome = f
            .gate
            .submit(post("bob", "b"), UserId::new(1), Timestamp::new(NOW + 3600))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Opened { .. }));
    }

    #[tokio::test]
    async fn open_vote_limit_is_global() {
        let params = CurationParams {
            max_open_votes: 1,
            posting_interval_secs: 0,
            ..CurationParams::default()
        };
        let f = fixture(params);
        f.store
            .put_credential(&Credential::activated(UserId::new(2), ChatId::new(2), "carol"))
            .unwrap();
        f.ledger.put_content(NullLedger::fresh_content("bob", "a", 300));
        f.ledger.put_content(NullLedger::fresh_content("bob", "b", 300));

        f.gate
            .submit(post("bob", "a"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        let outcome = f
            .gate
            .submit(post("bob", "b"), UserId::new(2), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(Rejection::TooManyOpenVotes)
        ));
    }

    #[tokio::test]
    async fn rejections_write_nothing() {
        let f = fixture(CurationParams::default());
        let mut content = NullLedger::fresh_content("bob", "short", 10);
        content.body = "tiny".to_string();
        f.ledger.put_content(content);

        let outcome = f
            .gate
            .submit(post("bob", "short"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected(Rejection::TooShort)));

        let outcome = f
            .gate
            .submit(post("bob", "missing"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(Rejection::ContentNotFound)
        ));
        assert_eq!(f.store.vote_count(), 0);
    }

    #[tokio::test]
    async fn inactive_submitter_and_excluded_community_are_rejected() {
        let f = fixture(CurationParams::default());
        f.ledger.put_content(NullLedger::fresh_content("bob", "p", 300));
        f.ledger.put_content(NullLedger::fresh_content("vox-populi", "p", 300));

        let outcome = f
            .gate
            .submit(post("bob", "p"), UserId::new(9), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Rejected(Rejection::NotActive)));

        let outcome = f
            .gate
            .submit(post("vox-populi", "p"), UserId::new(1), Timestamp::new(NOW))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(Rejection::ExcludedCommunity(_))
        ));
    }

    #[test]
    fn cooldown_scales_with_history() {
        assert_eq!(cooldown_interval(3600, &[]), 3600);
        let accepted = vec![vote_in(VoteState::Completed); 4];
        assert_eq!(cooldown_interval(3600, &accepted), 3600);
        let rejected = vec![vote_in(VoteState::Rejected); 4];
        assert_eq!(cooldown_interval(3600, &rejected), 7200);
        let mixed = vec![vote_in(VoteState::Completed), vote_in(VoteState::Addled)];
        assert_eq!(cooldown_interval(3600, &mixed), 5400);
    }

    proptest! {
        #[test]
        fn cooldown_stays_between_one_and_two_intervals(
            base in 0u64..100_000,
            accepted in 0usize..10,
            rejected in 0usize..10,
        ) {
            let mut history = vec![vote_in(VoteState::Completed); accepted];
            history.extend(vec![vote_in(VoteState::Rejected); rejected]);
            let interval = cooldown_interval(base, &history);
            prop_assert!(interval >= base);
            prop_assert!(interval <= base * 2);
        }
    }
}
