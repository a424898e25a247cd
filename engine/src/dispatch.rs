//! Fan-out of an accepted vote across every delegated account.

use crate::error::CurationError;
use curator_ledger::SharedLedger;
use curator_store::{CredentialStore, SharedStore};
use curator_types::Vote;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// One account whose approval did not go through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchFailure {
    pub account: String,
    pub reason: String,
}

/// Aggregate result of one dispatch batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub succeeded: usize,
    pub attempted: usize,
    pub failures: Vec<DispatchFailure>,
}

/// Submits weighted approvals from all active credentials, concurrently.
///
/// At most `concurrency` submissions are in flight; each is bounded by
/// `timeout`. Failures are per account and never abort the batch or get
/// retried. Raising the cancellation signal abandons in-flight submissions,
/// which then count as failures.
pub struct DispatchCoordinator {
    store: SharedStore,
    ledger: SharedLedger,
    concurrency: usize,
    timeout: Duration,
    cancel: watch::Receiver<bool>,
}

impl DispatchCoordinator {
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        concurrency: usize,
        timeout: Duration,
    ) -> Self {
        let (_never, cancel) = watch::channel(false);
        Self {
            store,
            ledger,
            concurrency: concurrency.max(1),
            timeout,
            cancel,
        }
    }

    /// Abandon batches when `cancel` turns true.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn dispatch(&self, vote: &Vote) -> Result<DispatchReport, CurationError> {
        self.dispatch_until(vote, self.cancel.clone()).await
    }

    /// Dispatch `vote`, abandoning the batch when `cancel` turns true.
    pub async fn dispatch_until(
        &self,
        vote: &Vote,
        cancel: watch::Receiver<bool>,
    ) -> Result<DispatchReport, CurationError> {
        let credentials = self.store.active_credentials()?;
        let attempted = credentials.len();
        if attempted == 0 {
            tracing::info!(vote = %vote.id, "no delegated accounts to dispatch from");
            return Ok(DispatchReport::default());
        }

        tracing::info!(vote = %vote.id, content = %vote.content, accounts = attempted, "dispatching approvals");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for credential in credentials {
            let ledger = Arc::clone(&self.ledger);
            let semaphore = Arc::clone(&semaphore);
            let mut cancel = cancel.clone();
            let author = vote.content.author.clone();
            let permalink = vote.content.permalink.clone();
            let weight = credential.power.weight_bps() * i32::from(vote.percent) / 100;
            let timeout = self.timeout;
            let account = credential.account;

            tasks.spawn(async move {
                let submit = async {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|e| format!("dispatch pool closed: {e}"))?;
                    match tokio::time::timeout(
                        timeout,
                        ledger.submit_approval(&account, &author, &permalink, weight),
                    )
                    .await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
                    }
                };
                let outcome = tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel) => Err("cancelled".to_string()),
                    result = submit => result,
                };
                (account, outcome)
            });
        }

        let mut report = DispatchReport {
            attempted,
            ..DispatchReport::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.succeeded += 1,
                Ok((account, Err(reason))) => {
                    tracing::warn!(vote = %vote.id, %account, %reason, "approval failed");
                    report.failures.push(DispatchFailure { account, reason });
                }
                Err(e) => {
                    tracing::warn!(vote = %vote.id, error = %e, "approval task aborted");
                    report.failures.push(DispatchFailure {
                        account: "unknown".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            vote = %vote.id,
            succeeded = report.succeeded,
            attempted = report.attempted,
            "dispatch finished"
        );
        Ok(report)
    }
}

/// Resolves once the signal turns true; never if the sender is gone first.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_nullables::{NullLedger, NullStore};
    use curator_types::{
        ChatId, ContentRef, Credential, PowerPercent, Timestamp, UserId, VoteId, VoteState,
    };

    fn vote() -> Vote {
        Vote {
            id: VoteId::new(1),
            content: ContentRef::new("alice", "post1").unwrap(),
            submitter: UserId::new(1),
            submitted_at: Timestamp::new(0),
            percent: 100,
            state: VoteState::Completed,
        }
    }

    fn with_accounts(store: &NullStore, accounts: &[&str]) {
        for (i, account) in accounts.iter().enumerate() {
            let id = i as i64 + 1;
            store
                .put_credential(&Credential::activated(UserId::new(id), ChatId::new(id), *account))
                .unwrap();
        }
    }

    #[tokio::test]
    async fn zero_credentials_yield_empty_report() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        let coordinator = DispatchCoordinator::new(store, ledger.clone(), 4, Duration::from_secs(1));

        let report = coordinator.dispatch(&vote()).await.unwrap();
        assert_eq!((report.succeeded, report.attempted), (0, 0));
        assert!(ledger.approvals().is_empty());
    }

    #[tokio::test]
    async fn partial_failures_are_counted_not_fatal() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        with_accounts(&store, &["a", "b", "c", "d", "e"]);
        ledger.fail_account("b");
        ledger.fail_account("d");
        let coordinator = DispatchCoordinator::new(store, ledger.clone(), 2, Duration::from_secs(1));

        let report = coordinator.dispatch(&vote()).await.unwrap();
        assert_eq!((report.succeeded, report.attempted), (3, 5));
        let mut failed: Vec<_> = report.failures.iter().map(|f| f.account.as_str()).collect();
        failed.sort();
        assert_eq!(failed, vec!["b", "d"]);
        assert_eq!(ledger.approvals().len(), 3);
    }

    #[tokio::test]
    async fn weight_follows_delegated_power() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        let mut credential = Credential::activated(UserId::new(1), ChatId::new(1), "alice");
        credential.power = PowerPercent::new(40).unwrap();
        store.put_credential(&credential).unwrap();
        let coordinator = DispatchCoordinator::new(store, ledger.clone(), 1, Duration::from_secs(1));

        coordinator.dispatch(&vote()).await.unwrap();
        assert_eq!(ledger.approvals()[0].weight, 4000);
    }

    #[tokio::test]
    async fn slow_accounts_time_out() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        with_accounts(&store, &["fast", "slow"]);
        ledger.hang_account("slow");
        let coordinator =
            DispatchCoordinator::new(store, ledger.clone(), 4, Duration::from_millis(50));

        let report = coordinator.dispatch(&vote()).await.unwrap();
        assert_eq!((report.succeeded, report.attempted), (1, 2));
        assert!(report.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn cancellation_abandons_in_flight_submissions() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        with_accounts(&store, &["a", "b"]);
        ledger.hang_account("a");
        ledger.hang_account("b");
        let coordinator =
            DispatchCoordinator::new(store, ledger.clone(), 4, Duration::from_secs(3600));
        let (tx, rx) = watch::channel(false);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        });
        let report = coordinator.dispatch_until(&vote(), rx).await.unwrap();
        canceller.await.unwrap();

        assert_eq!((report.succeeded, report.attempted), (0, 2));
        assert!(report.failures.iter().all(|f| f.reason == "cancelled"));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let store = Arc::new(NullStore::new());
        let ledger = Arc::new(NullLedger::new());
        with_accounts(&store, &["a", "b", "c"]);
        ledger.hang_account("a");
        ledger.hang_account("b");
        let coordinator =
            DispatchCoordinator::new(store, ledger.clone(), 1, Duration::from_millis(40));

        let started = std::time::Instant::now();
        let report = coordinator.dispatch(&vote()).await.unwrap();

        // The two hanging accounts hold the single permit one after another.
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert_eq!((report.succeeded, report.attempted), (1, 3));
    }
}
