//! Time-based closing of open votes.

use crate::eligibility::is_fresh;
use crate::error::CurationError;
use crate::tally::{Resolution, TallyEngine};
use curator_ledger::SharedLedger;
use curator_messages::SharedVenue;
use curator_store::{ResponseStore, SharedStore, VoteStore};
use curator_types::{CurationParams, Tally, Vote, VoteId, VoteState};
use std::sync::Arc;

/// Result of one sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Nothing to look at.
    Idle,
    /// The candidate is still inside its payout window.
    StillFresh(VoteId),
    /// The candidate expired and was closed as `Addled`.
    Addled { vote: VoteId, sympathetic: bool },
    /// The best candidate was resolved through the tally engine.
    Resolved {
        vote: VoteId,
        resolution: Option<Resolution>,
    },
}

/// Sweeps open votes: expires stale ones and promotes early winners.
pub struct ExpiryMonitor {
    store: SharedStore,
    ledger: SharedLedger,
    tally: Arc<TallyEngine>,
    venue: SharedVenue,
    params: Arc<CurationParams>,
}

impl ExpiryMonitor {
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        tally: Arc<TallyEngine>,
        venue: SharedVenue,
        params: Arc<CurationParams>,
    ) -> Self {
        Self {
            store,
            ledger,
            tally,
            venue,
            params,
        }
    }

    /// Close the oldest open vote if its payout window has passed.
    pub async fn stale_sweep(&self) -> Result<SweepOutcome, CurationError> {
        let Some(vote) = self.store.oldest_open_vote()? else {
            return Ok(SweepOutcome::Idle);
        };
        if is_fresh(&*self.ledger, &vote.content).await {
            return Ok(SweepOutcome::StillFresh(vote.id));
        }
        self.addle(&vote).await
    }

    /// Resolve the open vote with the widest positive margin among those at quorum.
    pub async fn best_candidate_sweep(&self) -> Result<SweepOutcome, CurationError> {
        let Some((vote, tally)) = self.best_candidate()? else {
            return Ok(SweepOutcome::Idle);
        };
        if !is_fresh(&*self.ledger, &vote.content).await {
            return self.addle(&vote).await;
        }
        let resolution = self.tally.resolve(&vote, tally).await?;
        Ok(SweepOutcome::Resolved {
            vote: vote.id,
            resolution,
        })
    }

    fn best_candidate(&self) -> Result<Option<(Vote, Tally)>, CurationError> {
        let mut best: Option<(Vote, Tally)> = None;
        for vote in self.store.open_votes()? {
            let tally = self.store.tally(vote.id)?;
            if !tally.meets_quorum(self.params.required_votes) || tally.margin() <= 0 {
                continue;
            }
            if best
                .as_ref()
                .map_or(true, |(_, current)| tally.margin() > current.margin())
            {
                best = Some((vote, tally));
            }
        }
        Ok(best)
    }

    async fn addle(&self, vote: &Vote) -> Result<SweepOutcome, CurationError> {
        let tally = self.store.tally(vote.id)?;
        if !self.store.resolve(vote.id, VoteState::Addled, &[])? {
            return Ok(SweepOutcome::Idle);
        }
        let sympathetic = tally.positives >= tally.negatives;
        tracing::info!(vote = %vote.id, content = %vote.content, sympathetic, "vote addled");

        let text = if sympathetic {
            format!(
                "Sorry, {}: your post {} did not collect its votes in time. \
                 Write something even better next time and the curators will notice.",
                vote.content.author, vote.content
            )
        } else {
            format!("Post {} was rejected by the curators.", vote.content)
        };
        if let Err(e) = self.venue.announce(&text).await {
            tracing::warn!(vote = %vote.id, error = %e, "failed to announce addled vote");
        }
        Ok(SweepOutcome::Addled {
            vote: vote.id,
            sympathetic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchCoordinator;
    use curator_ledger::PayoutState;
    use curator_nullables::{NullLedger, NullStore, NullVenue};
    use curator_store::{CredentialStore, NewVote};
    use curator_types::{
        ChatId, ContentRef, Credential, Response, Timestamp, UserId, Verdict,
    };
    use std::time::Duration;

    struct Fixture {
        store: Arc<NullStore>,
        ledger: Arc<NullLedger>,
        venue: Arc<NullVenue>,
        monitor: ExpiryMonitor,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        let venue = Arc::new(NullVenue::new());
        let params = Arc::new(CurationParams::default());
        store
            .put_credential(&Credential::activated(UserId::new(1), ChatId::new(1), "alice"))
            .unwrap();
        let dispatch =
            DispatchCoordinator::new(store.clone(), ledger.clone(), 4, Duration::from_secs(1));
        let tally = Arc::new(TallyEngine::new(
            store.clone(),
            dispatch,
            venue.clone(),
            params.clone(),
        ));
        let monitor = ExpiryMonitor::new(store.clone(), ledger.clone(), tally, venue.clone(), params);
        Fixture {
            store,
            ledger,
            venue,
            monitor,
        }
    }

    fn open(f: &Fixture, permalink: &str, at: u64) -> Vote {
        f.store
            .insert_vote(&NewVote {
                content: ContentRef::new("bob", permalink).unwrap(),
                submitter: UserId::new(1),
                submitted_at: Timestamp::new(at),
                percent: 100,
            })
            .unwrap()
    }

    fn answer(f: &Fixture, vote: &Vote, voter: i64, verdict: Verdict) {
        f.store
            .insert_response(&Response {
                vote_id: vote.id,
                voter: UserId::new(voter),
                verdict,
                responded_at: Timestamp::new(1),
            })
            .unwrap();
    }

    fn archive(f: &Fixture, permalink: &str) {
        let mut content = NullLedger::fresh_content("bob", permalink, 300);
        content.payout_state = PayoutState::Archived;
        f.ledger.put_content(content);
    }

    #[tokio::test]
    async fn expired_vote_is_addled_without_dispatch() {
        let f = fixture();
        let vote = open(&f, "old", 10);
        open(&f, "new", 20);
        archive(&f, "old");

        let outcome = f.monitor.stale_sweep().await.unwrap();

        assert_eq!(
            outcome,
            SweepOutcome::Addled {
                vote: vote.id,
                sympathetic: true
            }
        );
        let stored = f.store.get_vote(vote.id).unwrap();
        assert_eq!(stored.state, VoteState::Addled);
        assert!(stored.completed());
        assert!(f.ledger.approvals().is_empty());
        assert!(f.venue.announcements()[0].starts_with("Sorry"));
    }

    #[tokio::test]
    async fn negative_tally_gets_rejection_wording() {
        let f = fixture();
        let vote = open(&f, "old", 10);
        answer(&f, &vote, 5, Verdict::Reject);
        archive(&f, "old");

        let outcome = f.monitor.stale_sweep().await.unwrap();
        assert!(matches!(outcome, SweepOutcome::Addled { sympathetic: false, .. }));
        assert!(f.venue.announcements()[0].contains("rejected"));
    }

    #[tokio::test]
    async fn fresh_or_unreachable_votes_stay_open() {
        let f = fixture();
        let vote = open(&f, "p", 10);
        f.ledger.put_content(NullLedger::fresh_content("bob", "p", 300));
        assert_eq!(
            f.monitor.stale_sweep().await.unwrap(),
            SweepOutcome::StillFresh(vote.id)
        );

        f.ledger.set_unreachable(true);
        assert_eq!(
            f.monitor.stale_sweep().await.unwrap(),
            SweepOutcome::StillFresh(vote.id)
        );
        assert_eq!(f.store.get_vote(vote.id).unwrap().state, VoteState::Open);
    }

    #[tokio::test]
    async fn empty_queue_is_idle() {
        let f = fixture();
        assert_eq!(f.monitor.stale_sweep().await.unwrap(), SweepOutcome::Idle);
        assert_eq!(f.monitor.best_candidate_sweep().await.unwrap(), SweepOutcome::Idle);
    }

    #[tokio::test]
    async fn best_candidate_has_widest_margin() {
        let f = fixture();
        let narrow = open(&f, "narrow", 10);
        let wide = open(&f, "wide", 20);
        let short = open(&f, "short", 30);
        for voter in 2..5 {
            answer(&f, &wide, voter, Verdict::Approve);
        }
        answer(&f, &narrow, 2, Verdict::Approve);
        answer(&f, &narrow, 3, Verdict::Approve);
        answer(&f, &narrow, 4, Verdict::Reject);
        answer(&f, &short, 2, Verdict::Approve);
        f.ledger.put_content(NullLedger::fresh_content("bob", "wide", 300));

        let outcome = f.monitor.best_candidate_sweep().await.unwrap();

        assert!(matches!(
            outcome,
            SweepOutcome::Resolved { vote, resolution: Some(Resolution::Accepted(_)) } if vote == wide.id
        ));
        assert_eq!(f.store.get_vote(narrow.id).unwrap().state, VoteState::Open);
        assert_eq!(f.ledger.approvals().len(), 1);
    }

    #[tokio::test]
    async fn stale_best_candidate_is_addled() {
        let f = fixture();
        let vote = open(&f, "p", 10);
        for voter in 2..5 {
            answer(&f, &vote, voter, Verdict::Approve);
        }
        archive(&f, "p");

        let outcome = f.monitor.best_candidate_sweep().await.unwrap();
        assert!(matches!(outcome, SweepOutcome::Addled { .. }));
        assert!(f.ledger.approvals().is_empty());
    }
}
