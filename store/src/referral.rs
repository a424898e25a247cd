//! Referral storage trait.

use crate::StoreError;
use curator_types::{Referral, UserId};

/// Trait for referral storage operations.
pub trait ReferralStore: Send + Sync {
    /// Record a pending referral. Fails with [`StoreError::Duplicate`] if the
    /// referred user already has one.
    fn put_referral(&self, referral: &Referral) -> Result<(), StoreError>;

    fn get_referral(&self, referred: UserId) -> Result<Option<Referral>, StoreError>;

    /// Atomically flip `completed` from false to true and record the referred
    /// account. Returns `Ok(true)` only for the call that flipped it.
    fn complete_referral(
        &self,
        referred: UserId,
        referred_account: &str,
    ) -> Result<bool, StoreError>;
}
