//! Credential storage trait.

use crate::StoreError;
use curator_types::{ChatId, Credential, PowerPercent, UserId};

/// Trait for credential storage operations.
///
/// Ratings are only written through [`crate::VoteStore::resolve`]. No method
/// here changes the rating of an existing row.
pub trait CredentialStore: Send + Sync {
    fn get_credential(&self, user: UserId) -> Result<Option<Credential>, StoreError>;

    fn credential_by_account(&self, account: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert the credential of `credential.user_id`, or replace every field
    /// of an existing one except its rating.
    ///
    /// Fails with [`StoreError::Duplicate`] if another user already holds the
    /// same ledger account.
    fn put_credential(&self, credential: &Credential) -> Result<(), StoreError>;

    /// Returns false if the user has no credential.
    fn set_power(&self, user: UserId, power: PowerPercent) -> Result<bool, StoreError>;

    /// Returns false if the user has no credential.
    fn set_active(&self, user: UserId, active: bool) -> Result<bool, StoreError>;

    /// Set the curator flag, moving the curator's chat when `chat` is given.
    /// Returns false if the user has no credential.
    fn set_curator(
        &self,
        user: UserId,
        curator: bool,
        chat: Option<ChatId>,
    ) -> Result<bool, StoreError>;

    fn active_credentials(&self) -> Result<Vec<Credential>, StoreError>;

    fn active_curators(&self) -> Result<Vec<Credential>, StoreError> {
        Ok(self
            .active_credentials()?
            .into_iter()
            .filter(|c| c.curator)
            .collect())
    }

    fn rating(&self, user: UserId) -> Result<Option<i64>, StoreError> {
        Ok(self.get_credential(user)?.map(|c| c.rating))
    }
}
