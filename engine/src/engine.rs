//! Wiring of every engine component over one set of collaborators.

use crate::activation::CredentialActivation;
use crate::dispatch::DispatchCoordinator;
use crate::expiry::ExpiryMonitor;
use crate::integrity::{IntegrityScreen, SharedChecker};
use crate::referral::ReferralSettlement;
use crate::report::SupportReport;
use crate::rewards::CurationRewards;
use crate::submission::SubmissionGate;
use crate::tally::TallyEngine;
use curator_ledger::SharedLedger;
use curator_messages::SharedVenue;
use curator_store::SharedStore;
use curator_types::CurationParams;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// The assembled curation engine.
///
/// Components that long-running tasks hold on to are behind `Arc`.
pub struct CurationEngine {
    store: SharedStore,
    params: Arc<CurationParams>,
    gate: SubmissionGate,
    tally: Arc<TallyEngine>,
    expiry: ExpiryMonitor,
    referrals: Arc<ReferralSettlement>,
    activation: CredentialActivation,
    rewards: CurationRewards,
    report: SupportReport,
    screen: Arc<IntegrityScreen>,
}

impl CurationEngine {
    /// Build every component. `cancel` aborts in-flight dispatch batches when
    /// it turns true.
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        venue: SharedVenue,
        checker: Option<SharedChecker>,
        params: CurationParams,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        let params = Arc::new(params);
        let dispatch = DispatchCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            params.dispatch_concurrency,
            Duration::from_secs(params.dispatch_timeout_secs),
        )
        .with_cancellation(cancel);
        let tally = Arc::new(TallyEngine::new(
            Arc::clone(&store),
            dispatch,
            Arc::clone(&venue),
            Arc::clone(&params),
        ));
        let referrals = Arc::new(ReferralSettlement::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            Arc::clone(&venue),
            Arc::clone(&params),
        ));

        Self {
            gate: SubmissionGate::new(Arc::clone(&store), Arc::clone(&ledger), Arc::clone(&params)),
            expiry: ExpiryMonitor::new(
                Arc::clone(&store),
                Arc::clone(&ledger),
                Arc::clone(&tally),
                Arc::clone(&venue),
                Arc::clone(&params),
            ),
            activation: CredentialActivation::new(
                Arc::clone(&store),
                Arc::clone(&ledger),
                Arc::clone(&referrals),
                Arc::clone(&params),
            ),
            rewards: CurationRewards::new(Arc::clone(&store), Arc::clone(&ledger), Arc::clone(&params)),
            report: SupportReport::new(Arc::clone(&store), Arc::clone(&venue), Arc::clone(&params)),
            screen: Arc::new(IntegrityScreen::new(
                Arc::clone(&store),
                ledger,
                checker,
                venue,
                Arc::clone(&params),
            )),
            tally,
            referrals,
            store,
            params,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn params(&self) -> &CurationParams {
        &self.params
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub fn tally(&self) -> &Arc<TallyEngine> {
        &self.tally
    }

    pub fn expiry(&self) -> &ExpiryMonitor {
        &self.expiry
    }

    pub fn referrals(&self) -> &Arc<ReferralSettlement> {
        &self.referrals
    }

    pub fn activation(&self) -> &CredentialActivation {
        &self.activation
    }

    pub fn rewards(&self) -> &CurationRewards {
        &self.rewards
    }

    pub fn report(&self) -> &SupportReport {
        &self.report
    }

    pub fn screen(&self) -> &Arc<IntegrityScreen> {
        &self.screen
    }
}
