//! Referral registration and one-shot payout.

use crate::error::CurationError;
use curator_ledger::SharedLedger;
use curator_messages::SharedVenue;
use curator_store::{CredentialStore, ReferralStore, SharedStore, StoreError};
use curator_types::{Asset, CurationParams, Referral, UserId};
use std::sync::Arc;

/// Result of a settlement trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Both accounts received the referral fee.
    Paid,
    NoReferral,
    /// Another trigger already settled this referral.
    AlreadySettled,
    SelfReferral,
    /// The referred account has fewer posts than required.
    TooFewPosts { posts: u64 },
    /// Settled, but the ledger refused at least one transfer.
    PayoutFailed,
}

pub struct ReferralSettlement {
    store: SharedStore,
    ledger: SharedLedger,
    venue: SharedVenue,
    params: Arc<CurationParams>,
}

impl ReferralSettlement {
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        venue: SharedVenue,
        params: Arc<CurationParams>,
    ) -> Self {
        Self {
            store,
            ledger,
            venue,
            params,
        }
    }

    /// Record a pending referral for a newcomer.
    ///
    /// Only users without a credential can be referred, and only by an
    /// active account. Returns whether a referral was stored.
    pub fn register(&self, referred: UserId, referrer_account: &str) -> Result<bool, CurationError> {
        if self.store.get_credential(referred)?.is_some() {
            return Ok(false);
        }
        let referrer_active = self
            .store
            .credential_by_account(referrer_account)?
            .is_some_and(|c| c.active);
        if !referrer_active {
            tracing::debug!(%referred, referrer = referrer_account, "referrer is not active");
            return Ok(false);
        }
        match self
            .store
            .put_referral(&Referral::pending(referred, referrer_account))
        {
            Ok(()) => {
                tracing::info!(%referred, referrer = referrer_account, "referral registered");
                Ok(true)
            }
            Err(StoreError::Duplicate(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Settle the referral of `referred`, now active as `referred_account`.
    ///
    /// The completed flag flips before any payout is attempted, so repeated
    /// triggers pay at most once. Failed transfers are logged, not retried.
    pub async fn settle(
        &self,
        referred: UserId,
        referred_account: &str,
    ) -> Result<SettlementOutcome, CurationError> {
        let Some(referral) = self.store.get_referral(referred)? else {
            return Ok(SettlementOutcome::NoReferral);
        };
        if !self.store.complete_referral(referred, referred_account)? {
            return Ok(SettlementOutcome::AlreadySettled);
        }

        let referrer = referral.referrer_account.as_str();
        if referrer == referred_account {
            tracing::info!(account = referred_account, "referrer and referred are the same account");
            return Ok(SettlementOutcome::SelfReferral);
        }

        let account = match self.ledger.get_account(referred_account).await {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(account = referred_account, error = %e, "could not load referred account");
                return Ok(SettlementOutcome::PayoutFailed);
            }
        };
        if account.post_count < self.params.referral_min_posts {
            tracing::info!(
                account = referred_account,
                posts = account.post_count,
                "no referral fee for a newcomer with too few posts"
            );
            return Ok(SettlementOutcome::TooFewPosts {
                posts: account.post_count,
            });
        }

        let fee = Asset::from_milli(self.params.referral_fee_milli, &self.params.vesting_symbol);
        let service = self.params.service_account.as_str();
        let mut failed = false;
        for recipient in [referrer, referred_account] {
            if let Err(e) = self.ledger.transfer_to_vesting(service, recipient, &fee).await {
                tracing::warn!(%recipient, error = %e, "referral fee transfer failed");
                failed = true;
            }
        }
        if failed {
            return Ok(SettlementOutcome::PayoutFailed);
        }

        let text = format!(
            "Referrer @{referrer} and newcomer @{referred_account} each receive {fee} \
             through the referral program"
        );
        if let Err(e) = self.venue.announce(&text).await {
            tracing::warn!(error = %e, "failed to announce referral payout");
        }
        Ok(SettlementOutcome::Paid)
    }
}
