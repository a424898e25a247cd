//! Periodic jobs: the two expiry sweeps, the authority audit and the weekly
//! and daily cadences.
//!
//! Every job runs in its own task, sleeps until its next slot and stops on
//! the node's broadcast shutdown signal. A failed iteration is logged and
//! retried on the next slot.

use crate::metrics::NodeMetrics;
use crate::NodeError;
use chrono::{DateTime, Utc, Weekday};
use curator_engine::{CurationEngine, Resolution, SweepOutcome};
use curator_store::{CredentialStore, VoteStore};
use curator_types::Clock;
use curator_utils::{format_duration, until_next_daily, until_next_weekly};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// The work a periodic task performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Job {
    StaleSweep,
    BestCandidateSweep,
    AuthorityAudit,
    CuratorRewards,
    SupportReport,
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::StaleSweep => "stale_sweep",
            Job::BestCandidateSweep => "best_candidate_sweep",
            Job::AuthorityAudit => "authority_audit",
            Job::CuratorRewards => "curator_rewards",
            Job::SupportReport => "support_report",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a job fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Immediately, then after every `period`.
    Every(Duration),
    /// Every day at `hour:minute` UTC.
    Daily { hour: u32, minute: u32 },
    /// Every week on `weekday` at `hour:00` UTC.
    Weekly { weekday: Weekday, hour: u32 },
}

impl Schedule {
    /// Delay before the next run. `first` is true before the job has run once.
    pub fn next_delay(&self, now: DateTime<Utc>, first: bool) -> Duration {
        match *self {
            Schedule::Every(_) if first => Duration::ZERO,
            Schedule::Every(period) => period,
            Schedule::Daily { hour, minute } => until_next_daily(now, hour, minute),
            Schedule::Weekly { weekday, hour } => until_next_weekly(now, weekday, hour),
        }
    }
}

/// Everything a job needs; cheap to clone into each task.
#[derive(Clone)]
pub struct JobContext {
    pub engine: Arc<CurationEngine>,
    pub metrics: Arc<NodeMetrics>,
    pub clock: Arc<dyn Clock>,
}

impl JobContext {
    /// Run one iteration of `job`, record its outcome and refresh the gauges.
    pub async fn run(&self, job: Job) {
        let result = match job {
            Job::StaleSweep => self.stale_sweep().await,
            Job::BestCandidateSweep => self.best_candidate_sweep().await,
            Job::AuthorityAudit => self.authority_audit().await,
            Job::CuratorRewards => self.curator_rewards().await,
            Job::SupportReport => self.support_report().await,
        };
        if let Err(e) = result {
            self.metrics.loop_errors.inc();
            tracing::warn!(job = %job, error = %e, "periodic job failed");
        }
        self.refresh_gauges();
    }

    async fn stale_sweep(&self) -> Result<(), NodeError> {
        let outcome = self.engine.expiry().stale_sweep().await?;
        self.record_sweep(&outcome);
        Ok(())
    }

    async fn best_candidate_sweep(&self) -> Result<(), NodeError> {
        let outcome = self.engine.expiry().best_candidate_sweep().await?;
        self.record_sweep(&outcome);
        Ok(())
    }

    async fn authority_audit(&self) -> Result<(), NodeError> {
        let summary = self.engine.activation().audit_authority().await?;
        self.metrics.credentials_revoked.inc_by(summary.revoked as u64);
        Ok(())
    }

    async fn curator_rewards(&self) -> Result<(), NodeError> {
        let summary = self.engine.rewards().distribute(self.clock.now()).await?;
        self.metrics.rewards_paid.inc_by(summary.paid.len() as u64);
        Ok(())
    }

    async fn support_report(&self) -> Result<(), NodeError> {
        let supported = self.engine.report().publish(self.clock.now()).await?;
        if !supported.is_empty() {
            self.metrics.reports_published.inc();
        }
        Ok(())
    }

    fn record_sweep(&self, outcome: &SweepOutcome) {
        match outcome {
            SweepOutcome::Addled { vote, sympathetic } => {
                self.metrics.votes_addled.inc();
                tracing::info!(vote = %vote, sympathetic, "vote addled");
            }
            SweepOutcome::Resolved {
                vote,
                resolution: Some(resolution),
            } => {
                self.metrics.votes_promoted.inc();
                let accepted = matches!(resolution, Resolution::Accepted(_));
                tracing::info!(vote = %vote, accepted, "best candidate resolved");
            }
            SweepOutcome::Resolved { resolution: None, .. }
            | SweepOutcome::StillFresh(_)
            | SweepOutcome::Idle => {}
        }
    }

    fn refresh_gauges(&self) {
        self.metrics
            .approvals_dispatched
            .observe(self.engine.tally().approvals_dispatched());
        let store = self.engine.store();
        match store.open_vote_count() {
            Ok(count) => self.metrics.open_votes.set(count as i64),
            Err(e) => tracing::debug!(error = %e, "failed to count open votes"),
        }
        match store.active_credentials() {
            Ok(credentials) => self.metrics.active_credentials.set(credentials.len() as i64),
            Err(e) => tracing::debug!(error = %e, "failed to count active credentials"),
        }
    }
}

/// Drive `job` on `schedule` until the shutdown signal arrives.
pub async fn run_periodic(
    ctx: JobContext,
    job: Job,
    schedule: Schedule,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    tracing::info!(job = %job, ?schedule, "periodic job started");
    let mut first = true;
    loop {
        let delay = schedule.next_delay(Utc::now(), first);
        first = false;
        if !delay.is_zero() {
            tracing::debug!(job = %job, next_in = %format_duration(delay.as_secs()), "job scheduled");
        }
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => {
                tracing::info!(job = %job, "periodic job shutting down");
                break;
            }
            _ = tokio::time::sleep(delay) => {
                ctx.run(job).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use curator_nullables::{NullClock, NullLedger, NullStore, NullVenue};
    use curator_store::{EventStore, NewVote};
    use curator_types::{
        ChatId, ContentRef, Credential, CurationParams, EventKind, Tally, Timestamp, UserId,
        VoteState,
    };
    use tokio::sync::watch;

    fn context() -> (JobContext, Arc<NullStore>, watch::Sender<bool>) {
        let store = Arc::new(NullStore::new());
        let (cancel, cancel_rx) = watch::channel(false);
        let engine = CurationEngine::new(
            store.clone(),
            Arc::new(NullLedger::new()),
            Arc::new(NullVenue::new()),
            None,
            CurationParams::default(),
            cancel_rx,
        );
        let ctx = JobContext {
            engine: Arc::new(engine),
            metrics: Arc::new(NodeMetrics::new()),
            clock: Arc::new(NullClock::new(50_000)),
        };
        (ctx, store, cancel)
    }

    #[test]
    fn every_schedule_fires_immediately_then_waits() {
        let schedule = Schedule::Every(Duration::from_secs(60));
        let now = Utc::now();
        assert_eq!(schedule.next_delay(now, true), Duration::ZERO);
        assert_eq!(schedule.next_delay(now, false), Duration::from_secs(60));
    }

    #[test]
    fn daily_schedule_waits_for_the_slot() {
        let schedule = Schedule::Daily { hour: 12, minute: 0 };
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        assert_eq!(schedule.next_delay(now, true), Duration::from_secs(3600));
    }

    #[test]
    fn weekly_schedule_waits_for_the_weekday() {
        // 2024-03-09 is a Saturday.
        let schedule = Schedule::Weekly {
            weekday: Weekday::Sun,
            hour: 20,
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(schedule.next_delay(now, true), Duration::from_secs(24 * 3600));
    }

    #[tokio::test]
    async fn stale_sweep_addles_expired_vote_and_counts_it() {
        let (ctx, store, _cancel) = context();
        // The ledger knows nothing about the post, so its payout window is over.
        let vote = store
            .insert_vote(&NewVote {
                content: ContentRef::new("alice", "gone").unwrap(),
                submitter: UserId::new(1),
                submitted_at: Timestamp::new(100),
                percent: 100,
            })
            .unwrap();

        ctx.run(Job::StaleSweep).await;

        assert_eq!(store.get_vote(vote.id).unwrap().state, VoteState::Addled);
        assert_eq!(ctx.metrics.votes_addled.get(), 1);
        assert_eq!(ctx.metrics.open_votes.get(), 0);
        assert_eq!(ctx.metrics.loop_errors.get(), 0);
    }

    #[tokio::test]
    async fn empty_report_records_the_run_without_counting_it() {
        let (ctx, store, _cancel) = context();

        ctx.run(Job::SupportReport).await;

        assert_eq!(
            store.last_event(EventKind::Report).unwrap(),
            Some(Timestamp::new(50_000))
        );
        assert_eq!(ctx.metrics.reports_published.get(), 0);
    }

    #[tokio::test]
    async fn approvals_from_any_resolution_path_are_counted() {
        let (ctx, store, _cancel) = context();
        store
            .put_credential(&Credential::activated(UserId::new(1), ChatId::new(1), "alice"))
            .unwrap();
        let vote = store
            .insert_vote(&NewVote {
                content: ContentRef::new("bob", "post").unwrap(),
                submitter: UserId::new(1),
                submitted_at: Timestamp::new(100),
                percent: 100,
            })
            .unwrap();
        // Resolved outside the sweeps, as a curator response would.
        let resolution = ctx.engine.tally().resolve(&vote, Tally::new(1, 0)).await.unwrap();
        assert!(matches!(resolution, Some(Resolution::Accepted(_))));

        ctx.run(Job::AuthorityAudit).await;

        assert_eq!(ctx.metrics.approvals_dispatched.get(), 1);
    }

    #[tokio::test]
    async fn failing_job_is_counted() {
        let (ctx, _store, _cancel) = context();
        // The service account is unknown to the ledger.
        ctx.run(Job::CuratorRewards).await;
        assert_eq!(ctx.metrics.loop_errors.get(), 1);
    }

    #[tokio::test]
    async fn periodic_job_stops_on_shutdown() {
        let (ctx, _store, _cancel) = context();
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_periodic(
            ctx,
            Job::BestCandidateSweep,
            Schedule::Every(Duration::from_secs(3600)),
            rx,
        ));
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("job should stop")
            .unwrap();
    }
}
