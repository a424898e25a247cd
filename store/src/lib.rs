//! Abstract storage traits for the curation service.
//!
//! Every storage backend (SQLite, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Two operations carry the consistency guarantees of the engine and must be
//! atomic in every backend:
//! - [`VoteStore::resolve`]: check-and-set of a vote's Open→terminal
//!   transition together with the rating changes it causes.
//! - [`ReferralStore::complete_referral`]: check-and-set of a referral's
//!   completed flag.
//!
//! Response uniqueness per (vote, voter) is enforced by
//! [`ResponseStore::insert_response`].

pub mod conversation;
pub mod credential;
pub mod error;
pub mod event;
pub mod referral;
pub mod response;
pub mod vote;

use std::sync::Arc;

pub use conversation::ConversationStore;
pub use credential::CredentialStore;
pub use error::StoreError;
pub use event::EventStore;
pub use referral::ReferralStore;
pub use response::ResponseStore;
pub use vote::{NewVote, RatingChange, VoteStore};

/// Everything the engine needs from a backend.
pub trait CurationStore:
    VoteStore + ResponseStore + CredentialStore + ReferralStore + ConversationStore + EventStore
{
}

impl<T> CurationStore for T where
    T: VoteStore + ResponseStore + CredentialStore + ReferralStore + ConversationStore + EventStore
{
}

/// Shared handle to the backend, cloned into every component.
pub type SharedStore = Arc<dyn CurationStore>;
