//! The ledger client contract.

use crate::account::AccountInfo;
use crate::content::ContentInfo;
use crate::error::LedgerError;
use async_trait::async_trait;
use curator_types::Asset;
use std::sync::Arc;

/// Operations the engine performs against the ledger.
///
/// Calls carry no timeout of their own; callers that need one wrap them.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_content(&self, author: &str, permalink: &str) -> Result<ContentInfo, LedgerError>;

    async fn get_account(&self, name: &str) -> Result<AccountInfo, LedgerError>;

    /// Submit a weighted approval of a post under `account`'s own authority.
    /// `weight` is in basis points, 10000 being a full-power approval.
    async fn submit_approval(
        &self,
        account: &str,
        author: &str,
        permalink: &str,
        weight: i32,
    ) -> Result<(), LedgerError>;

    /// Publish a reply under `author` to the post `parent_author/parent_permalink`.
    async fn post_comment(
        &self,
        author: &str,
        parent_author: &str,
        parent_permalink: &str,
        body: &str,
    ) -> Result<(), LedgerError>;

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError>;

    async fn transfer_to_vesting(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
    ) -> Result<(), LedgerError>;
}

/// Shared handle to the ledger client.
pub type SharedLedger = Arc<dyn LedgerClient>;
