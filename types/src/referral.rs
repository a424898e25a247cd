//! Referrals between an active user and a newcomer.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// A referral recorded when a newcomer arrives with a referral code.
///
/// `completed` flips from false to true exactly once; the payout follows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    /// The newcomer.
    pub referred: UserId,
    /// Ledger account of the user who shared the referral link.
    pub referrer_account: String,
    /// Ledger account of the newcomer, known once they activate.
    pub referred_account: Option<String>,
    pub completed: bool,
}

impl Referral {
    pub fn pending(referred: UserId, referrer_account: impl Into<String>) -> Self {
        Self {
            referred,
            referrer_account: referrer_account.into(),
            referred_account: None,
            completed: false,
        }
    }
}
