//! Accounts as the ledger reports them.

use curator_types::Asset;
use serde::{Deserialize, Serialize};

/// A ledger account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    /// Accounts holding posting authority over this one.
    #[serde(default)]
    pub posting_authorities: Vec<String>,
    /// Voting power in whole vesting units.
    pub voting_power: u64,
    pub post_count: u64,
    /// Liquid balance.
    pub balance: Asset,
}

impl AccountInfo {
    /// Whether `service_account` may act on behalf of this account.
    pub fn has_delegated_to(&self, service_account: &str) -> bool {
        self.posting_authorities
            .iter()
            .any(|authority| authority == service_account)
    }
}
