//! Curator responses and vote resolution.

use crate::dispatch::{DispatchCoordinator, DispatchReport};
use crate::error::CurationError;
use crate::rating::{RatingChanges, RatingLedger};
use curator_messages::SharedVenue;
use curator_store::{CredentialStore, ResponseStore, SharedStore, StoreError, VoteStore};
use curator_types::{
    CurationParams, Response, Tally, Timestamp, UserId, Verdict, Vote, VoteId, VoteState,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What happened to a vote that reached quorum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Completed; the approvals were dispatched.
    Accepted(DispatchReport),
    /// Rejected; the submitter lost rating and may have been removed.
    Rejected { submitter_removed: bool },
}

/// Result of a curator response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseOutcome {
    Recorded {
        tally: Tally,
        /// Set for the response that resolved the vote.
        resolution: Option<Resolution>,
    },
    /// The curator already answered this vote; nothing changed.
    Duplicate { verdict: Verdict },
    NotCurator,
    RatingTooLow { rating: i64 },
    UnknownVote,
    VoteClosed,
}

/// Records curator responses and resolves votes exactly once.
pub struct TallyEngine {
    store: SharedStore,
    ratings: RatingLedger,
    dispatch: DispatchCoordinator,
    venue: SharedVenue,
    params: Arc<CurationParams>,
    approvals_dispatched: AtomicU64,
}

impl TallyEngine {
    pub fn new(
        store: SharedStore,
        dispatch: DispatchCoordinator,
        venue: SharedVenue,
        params: Arc<CurationParams>,
    ) -> Self {
        Self {
            ratings: RatingLedger::new(Arc::clone(&store)),
            store,
            dispatch,
            venue,
            params,
            approvals_dispatched: AtomicU64::new(0),
        }
    }

    pub fn ratings(&self) -> &RatingLedger {
        &self.ratings
    }

    /// Approvals the ledger accepted for every vote this engine completed.
    pub fn approvals_dispatched(&self) -> u64 {
        self.approvals_dispatched.load(Ordering::Relaxed)
    }

    pub async fn record_response(
        &self,
        vote_id: VoteId,
        voter: UserId,
        verdict: Verdict,
        now: Timestamp,
    ) -> Result<ResponseOutcome, CurationError> {
        if let Some(prior) = self.store.get_response(vote_id, voter)? {
            return Ok(ResponseOutcome::Duplicate {
                verdict: prior.verdict,
            });
        }

        let Some(credential) = self
            .store
            .get_credential(voter)?
            .filter(|c| c.is_active_curator())
        else {
            return Ok(ResponseOutcome::NotCurator);
        };
        if credential.rating <= self.params.min_curator_rating {
            return Ok(ResponseOutcome::RatingTooLow {
                rating: credential.rating,
            });
        }

        let vote = match self.store.get_vote(vote_id) {
            Ok(vote) => vote,
            Err(StoreError::NotFound(_)) => return Ok(ResponseOutcome::UnknownVote),
            Err(e) => return Err(e.into()),
        };
        if vote.state.is_terminal() {
            return Ok(ResponseOutcome::VoteClosed);
        }

        let response = Response {
            vote_id,
            voter,
            verdict,
            responded_at: now,
        };
        if !self.store.insert_response(&response)? {
            let prior = self
                .store
                .get_response(vote_id, voter)?
                .map_or(verdict, |r| r.verdict);
            return Ok(ResponseOutcome::Duplicate { verdict: prior });
        }

        let tally = self.store.tally(vote_id)?;
        tracing::debug!(
            vote = %vote_id,
            %voter,
            positives = tally.positives,
            negatives = tally.negatives,
            "response recorded"
        );

        let resolution = if tally.meets_quorum(self.params.required_votes) {
            self.resolve(&vote, tally).await?
        } else {
            None
        };

        Ok(ResponseOutcome::Recorded { tally, resolution })
    }

    /// Resolve `vote` according to `tally`.
    ///
    /// A strict positive majority completes the vote, otherwise it is
    /// rejected. Returns `None` when another caller already resolved it.
    pub async fn resolve(
        &self,
        vote: &Vote,
        tally: Tally,
    ) -> Result<Option<Resolution>, CurationError> {
        if tally.is_accepted() {
            self.accept(vote).await
        } else {
            self.reject(vote).await
        }
    }

    async fn accept(&self, vote: &Vote) -> Result<Option<Resolution>, CurationError> {
        let mut changes = RatingChanges::new();
        changes.increment(vote.submitter, 1);
        if !self.ratings.commit(vote.id, VoteState::Completed, &changes)? {
            return Ok(None);
        }
        tracing::info!(vote = %vote.id, content = %vote.content, "vote accepted");

        let report = self.dispatch.dispatch(vote).await?;
        self.approvals_dispatched
            .fetch_add(report.succeeded as u64, Ordering::Relaxed);
        let text = format!(
            "Approved from {} of {} accounts\n{}",
            report.succeeded,
            report.attempted,
            vote.content.link(&self.params.frontend_url)
        );
        if let Err(e) = self.venue.announce(&text).await {
            tracing::warn!(vote = %vote.id, error = %e, "failed to announce accepted vote");
        }
        Ok(Some(Resolution::Accepted(report)))
    }

    async fn reject(&self, vote: &Vote) -> Result<Option<Resolution>, CurationError> {
        let penalty = 2 * i64::from(self.params.required_votes);
        let mut changes = RatingChanges::new();
        changes.decrement(vote.submitter, penalty);
        for response in self.store.responses_for(vote.id)? {
            if !response.verdict.is_positive() {
                changes.increment(response.voter, 1);
            }
        }
        if !self.ratings.commit(vote.id, VoteState::Rejected, &changes)? {
            return Ok(None);
        }
        tracing::info!(vote = %vote.id, content = %vote.content, "vote rejected");

        let mut submitter_removed = false;
        if self.ratings.rating(vote.submitter)?.is_some_and(|r| r < 0) {
            match self.venue.remove_member(vote.submitter).await {
                Ok(()) => {
                    submitter_removed = true;
                    tracing::info!(user = %vote.submitter, "submitter removed after rating dropped below zero");
                }
                Err(e) => {
                    tracing::warn!(user = %vote.submitter, error = %e, "failed to remove submitter");
                }
            }
        }
        Ok(Some(Resolution::Rejected { submitter_removed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_nullables::{NullLedger, NullStore, NullVenue};
    use curator_store::NewVote;
    use curator_types::{ChatId, ContentRef, Credential};
    use std::time::Duration;

    const SUBMITTER: i64 = 1;

    struct Fixture {
        store: Arc<NullStore>,
        ledger: Arc<NullLedger>,
        venue: Arc<NullVenue>,
        engine: TallyEngine,
        vote: Vote,
    }

    fn fixture(required_votes: u32, curators: i64) -> Fixture {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        let venue = Arc::new(NullVenue::new());
        let params = Arc::new(CurationParams {
            required_votes,
            ..CurationParams::default()
        });

        store
            .put_credential(&Credential::activated(
                UserId::new(SUBMITTER),
                ChatId::new(SUBMITTER),
                "submitter",
            ))
            .unwrap();
        for id in 10..10 + curators {
            let mut curator =
                Credential::activated(UserId::new(id), ChatId::new(id), format!("curator{id}"));
            curator.curator = true;
            store.put_credential(&curator).unwrap();
        }
        let vote = store
            .insert_vote(&NewVote {
                content: ContentRef::new("alice", "post1").unwrap(),
                submitter: UserId::new(SUBMITTER),
                submitted_at: Timestamp::new(1),
                percent: 100,
            })
            .unwrap();

        let dispatch =
            DispatchCoordinator::new(store.clone(), ledger.clone(), 4, Duration::from_secs(1));
        let engine = TallyEngine::new(store.clone(), dispatch, venue.clone(), params);
        Fixture {
            store,
            ledger,
            venue,
            engine,
            vote,
        }
    }

    async fn respond(f: &Fixture, voter: i64, verdict: Verdict) -> ResponseOutcome {
        f.engine
            .record_response(f.vote.id, UserId::new(voter), verdict, Timestamp::new(5))
            .await
            .unwrap()
    }

    fn rating(f: &Fixture, user: i64) -> i64 {
        f.store.rating(UserId::new(user)).unwrap().unwrap()
    }

    #[tokio::test]
    async fn majority_positive_completes_and_dispatches() {
        let f = fixture(3, 3);
        respond(&f, 10, Verdict::Reject).await;
        respond(&f, 11, Verdict::Approve).await;
        let outcome = respond(&f, 12, Verdict::Approve).await;

        let ResponseOutcome::Recorded {
            tally,
            resolution: Some(Resolution::Accepted(report)),
        } = outcome
        else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(tally, Tally::new(2, 1));
        assert_eq!(report.attempted, 4);
        assert_eq!(f.store.get_vote(f.vote.id).unwrap().state, VoteState::Completed);
        assert_eq!(rating(&f, SUBMITTER), 1);
        assert_eq!(f.ledger.approvals().len(), 4);
        assert_eq!(f.engine.approvals_dispatched(), 4);
        assert!(f.venue.announcements()[0].contains("4 of 4"));
    }

    #[tokio::test]
    async fn majority_negative_rejects_and_rewards_dissent() {
        let f = fixture(3, 3);
        respond(&f, 10, Verdict::Reject).await;
        respond(&f, 11, Verdict::Reject).await;
        let outcome = respond(&f, 12, Verdict::Approve).await;

        assert!(matches!(
            outcome,
            ResponseOutcome::Recorded {
                resolution: Some(Resolution::Rejected { .. }),
                ..
            }
        ));
        assert_eq!(f.store.get_vote(f.vote.id).unwrap().state, VoteState::Rejected);
        assert_eq!(rating(&f, SUBMITTER), -6);
        assert_eq!(rating(&f, 10), 1);
        assert_eq!(rating(&f, 11), 1);
        assert_eq!(rating(&f, 12), 0);
        assert!(f.ledger.approvals().is_empty());
        assert_eq!(f.venue.removed(), vec![UserId::new(SUBMITTER)]);
    }

    #[tokio::test]
    async fn tie_at_quorum_rejects() {
        let f = fixture(4, 4);
        respond(&f, 10, Verdict::Approve).await;
        respond(&f, 11, Verdict::Reject).await;
        respond(&f, 12, Verdict::Approve).await;
        respond(&f, 13, Verdict::Reject).await;

        assert_eq!(f.store.get_vote(f.vote.id).unwrap().state, VoteState::Rejected);
        assert!(f.ledger.approvals().is_empty());
    }

    #[tokio::test]
    async fn repeated_response_changes_nothing() {
        let f = fixture(3, 3);
        respond(&f, 10, Verdict::Reject).await;
        let outcome = respond(&f, 10, Verdict::Approve).await;

        assert_eq!(
            outcome,
            ResponseOutcome::Duplicate {
                verdict: Verdict::Reject
            }
        );
        assert_eq!(f.store.tally(f.vote.id).unwrap(), Tally::new(0, 1));
        assert_eq!(rating(&f, 10), 0);
    }

    #[tokio::test]
    async fn non_curators_and_low_ratings_are_turned_away() {
        let f = fixture(3, 2);
        assert_eq!(respond(&f, SUBMITTER, Verdict::Approve).await, ResponseOutcome::NotCurator);
        assert_eq!(respond(&f, 99, Verdict::Approve).await, ResponseOutcome::NotCurator);

        let mut curator = Credential::activated(UserId::new(40), ChatId::new(40), "curator40");
        curator.curator = true;
        curator.rating = -10;
        f.store.put_credential(&curator).unwrap();
        assert_eq!(
            respond(&f, 40, Verdict::Approve).await,
            ResponseOutcome::RatingTooLow { rating: -10 }
        );
        assert_eq!(f.store.tally(f.vote.id).unwrap(), Tally::default());
    }

    #[tokio::test]
    async fn closed_and_unknown_votes_are_noops() {
        let f = fixture(3, 1);
        f.store.force_state(f.vote.id, VoteState::Addled);
        assert_eq!(respond(&f, 10, Verdict::Approve).await, ResponseOutcome::VoteClosed);

        let outcome = f
            .engine
            .record_response(VoteId::new(404), UserId::new(10), Verdict::Approve, Timestamp::new(5))
            .await
            .unwrap();
        assert_eq!(outcome, ResponseOutcome::UnknownVote);
    }

    #[tokio::test]
    async fn concurrent_resolution_happens_once() {
        let f = Arc::new(fixture(1, 1));
        let tally = Tally::new(1, 0);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                f.engine.resolve(&f.vote, tally).await.unwrap()
            }));
        }
        let mut resolved = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                resolved += 1;
            }
        }

        assert_eq!(resolved, 1);
        assert_eq!(rating(&f, SUBMITTER), 1);
        assert_eq!(f.ledger.approvals().len(), 2);
    }

    #[tokio::test]
    async fn removal_failure_is_not_fatal() {
        let f = fixture(1, 1);
        f.venue.set_failing(true);
        let outcome = respond(&f, 10, Verdict::Reject).await;
        assert!(matches!(
            outcome,
            ResponseOutcome::Recorded {
                resolution: Some(Resolution::Rejected {
                    submitter_removed: false
                }),
                ..
            }
        ));
    }
}
