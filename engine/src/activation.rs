//! Delegation lifecycle of user credentials.

use crate::error::CurationError;
use crate::referral::{ReferralSettlement, SettlementOutcome};
use curator_ledger::{LedgerError, SharedLedger};
use curator_store::{CredentialStore, SharedStore, StoreError};
use curator_types::{ChatId, Credential, CurationParams, PowerPercent, UserId};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    Activated {
        account: String,
        /// Set on the first activation of an account.
        referral: Option<SettlementOutcome>,
    },
    /// The account exists but did not grant posting authority to the service.
    NotDelegated { account: String },
    AccountNotFound { account: String },
    /// Another user already holds this account.
    AccountTaken { account: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerOutcome {
    Updated(PowerPercent),
    NotActive,
    /// The account's voting power is below the configured minimum.
    InsufficientVesting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CuratorOutcome {
    Enrolled,
    AlreadyCurator,
    NotActive,
}

/// Result of one authority audit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub checked: usize,
    pub revoked: usize,
    /// Accounts the ledger could not answer for; left untouched.
    pub skipped: usize,
}

/// Lower-case an account name and strip the leading `@`.
pub fn normalize_account(raw: &str) -> String {
    raw.trim().trim_matches('@').to_lowercase()
}

pub struct CredentialActivation {
    store: SharedStore,
    ledger: SharedLedger,
    referrals: Arc<ReferralSettlement>,
    params: Arc<CurationParams>,
}

impl CredentialActivation {
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        referrals: Arc<ReferralSettlement>,
        params: Arc<CurationParams>,
    ) -> Self {
        Self {
            store,
            ledger,
            referrals,
            params,
        }
    }

    /// Activate `user` as `raw_account` once the ledger confirms the delegation.
    pub async fn activate(
        &self,
        user: UserId,
        chat: ChatId,
        raw_account: &str,
    ) -> Result<ActivationOutcome, CurationError> {
        let account = normalize_account(raw_account);
        let info = match self.ledger.get_account(&account).await {
            Ok(info) => info,
            Err(LedgerError::NotFound(_)) => {
                return Ok(ActivationOutcome::AccountNotFound { account })
            }
            Err(e) => return Err(e.into()),
        };
        if !info.has_delegated_to(&self.params.service_account) {
            return Ok(ActivationOutcome::NotDelegated { account });
        }

        let first_activation = self.store.credential_by_account(&account)?.is_none();
        let credential = match self.store.get_credential(user)? {
            Some(existing) => Credential {
                chat_id: chat,
                account: account.clone(),
                power: PowerPercent::FULL,
                active: true,
                ..existing
            },
            None => Credential::activated(user, chat, account.clone()),
        };
        match self.store.put_credential(&credential) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Ok(ActivationOutcome::AccountTaken { account })
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(%user, %account, first_activation, "credential activated");

        let referral = if first_activation {
            Some(self.referrals.settle(user, &account).await?)
        } else {
            None
        };
        Ok(ActivationOutcome::Activated { account, referral })
    }

    /// Stop using the user's account. Returns false if it was not active.
    pub fn deactivate(&self, user: UserId) -> Result<bool, CurationError> {
        let Some(credential) = self.store.get_credential(user)?.filter(|c| c.active) else {
            return Ok(false);
        };
        self.store.set_curator(user, false, None)?;
        self.store.set_active(user, false)?;
        tracing::info!(%user, account = %credential.account, "credential deactivated");
        Ok(true)
    }

    pub async fn set_power(
        &self,
        user: UserId,
        power: PowerPercent,
    ) -> Result<PowerOutcome, CurationError> {
        let Some(credential) = self.store.get_credential(user)?.filter(|c| c.active) else {
            return Ok(PowerOutcome::NotActive);
        };
        let info = self.ledger.get_account(&credential.account).await?;
        if info.voting_power <= self.params.power_change_min_vesting {
            return Ok(PowerOutcome::InsufficientVesting);
        }
        if !self.store.set_power(user, power)? {
            return Ok(PowerOutcome::NotActive);
        }
        tracing::info!(%user, power = power.get(), "delegated power updated");
        Ok(PowerOutcome::Updated(power))
    }

    /// Make the user a curator, reachable in `chat`.
    pub fn enroll_curator(&self, user: UserId, chat: ChatId) -> Result<CuratorOutcome, CurationError> {
        let Some(credential) = self.store.get_credential(user)?.filter(|c| c.active) else {
            return Ok(CuratorOutcome::NotActive);
        };
        if credential.curator {
            return Ok(CuratorOutcome::AlreadyCurator);
        }
        self.store.set_curator(user, true, Some(chat))?;
        tracing::info!(%user, "curator enrolled");
        Ok(CuratorOutcome::Enrolled)
    }

    /// Returns false if the user was not a curator.
    pub fn leave_curator(&self, user: UserId) -> Result<bool, CurationError> {
        if !self
            .store
            .get_credential(user)?
            .is_some_and(|c| c.is_active_curator())
        {
            return Ok(false);
        }
        self.store.set_curator(user, false, None)?;
        tracing::info!(%user, "curator left");
        Ok(true)
    }

    /// Deactivate every credential whose delegation has been revoked.
    pub async fn audit_authority(&self) -> Result<AuditSummary, CurationError> {
        let mut summary = AuditSummary::default();
        for credential in self.store.active_credentials()? {
            summary.checked += 1;
            let info = match self.ledger.get_account(&credential.account).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(account = %credential.account, error = %e, "authority check failed");
                    summary.skipped += 1;
                    continue;
                }
            };
            if info.has_delegated_to(&self.params.service_account) {
                continue;
            }
            self.store.set_active(credential.user_id, false)?;
            summary.revoked += 1;
            tracing::info!(account = %credential.account, "delegation revoked, credential deactivated");
        }
        Ok(summary)
    }
}
