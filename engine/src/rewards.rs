//! Weekly reward payout to curators.

use crate::error::CurationError;
use curator_ledger::SharedLedger;
use curator_store::{CredentialStore, EventStore, ResponseStore, SharedStore};
use curator_types::{Asset, CurationParams, EventKind, Timestamp};
use std::sync::Arc;

const REWARD_MEMO: &str = "Curator reward";

/// What one reward run paid out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardSummary {
    /// Responses counted since the previous run.
    pub total_responses: u64,
    /// Responses needed per thousandth of the reward asset.
    pub cost: u64,
    /// Successful transfers, by account.
    pub paid: Vec<(String, Asset)>,
}

/// Number of responses one reward unit costs for the given balance, or
/// `None` when there is nothing to pay out.
pub fn response_cost(total_responses: u64, balance_milli: u64) -> Option<u64> {
    if balance_milli == 0 {
        None
    } else if balance_milli < total_responses {
        Some(total_responses / balance_milli)
    } else {
        Some(1)
    }
}

pub struct CurationRewards {
    store: SharedStore,
    ledger: SharedLedger,
    params: Arc<CurationParams>,
}

impl CurationRewards {
    pub fn new(store: SharedStore, ledger: SharedLedger, params: Arc<CurationParams>) -> Self {
        Self {
            store,
            ledger,
            params,
        }
    }

    /// Pay every active curator in proportion to their responses since the
    /// last reward run.
    ///
    /// An empty balance pays nothing and leaves the counting window open.
    pub async fn distribute(&self, now: Timestamp) -> Result<RewardSummary, CurationError> {
        let since = self
            .store
            .last_event(EventKind::Reward)?
            .unwrap_or(Timestamp::EPOCH);
        let counts = self.store.response_counts_since(since)?;
        let total_responses: u64 = counts.iter().map(|(_, n)| n).sum();

        let service = self.ledger.get_account(&self.params.service_account).await?;
        let balance = service.balance.milli();
        let Some(cost) = response_cost(total_responses, balance) else {
            tracing::warn!(total_responses, "service account has no balance for curator rewards");
            return Ok(RewardSummary {
                total_responses,
                ..RewardSummary::default()
            });
        };

        let mut paid = Vec::new();
        for (user, responses) in counts {
            let Some(credential) = self
                .store
                .get_credential(user)?
                .filter(|c| c.is_active_curator())
            else {
                continue;
            };
            let amount = Asset::from_milli(responses / cost, &self.params.reward_symbol);
            if amount.is_zero() {
                continue;
            }
            match self
                .ledger
                .transfer(&self.params.service_account, &credential.account, &amount, REWARD_MEMO)
                .await
            {
                Ok(()) => paid.push((credential.account, amount)),
                Err(e) => {
                    tracing::warn!(account = %credential.account, error = %e, "curator reward transfer failed")
                }
            }
        }

        self.store.record_event(EventKind::Reward, now)?;
        tracing::info!(total_responses, cost, paid = paid.len(), "curator rewards distributed");
        Ok(RewardSummary {
            total_responses,
            cost,
            paid,
        })
    }
}
