//! Fundamental types for the collective curation service.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identifiers, content references, votes and their tallies, curator credentials,
//! referrals, ledger assets, timestamps and the curation parameters.

pub mod asset;
pub mod content;
pub mod credential;
pub mod error;
pub mod ids;
pub mod params;
pub mod referral;
pub mod state;
pub mod time;
pub mod vote;

pub use asset::Asset;
pub use content::ContentRef;
pub use credential::{Credential, PowerPercent};
pub use error::TypesError;
pub use ids::{ChatId, UserId, VoteId};
pub use params::CurationParams;
pub use referral::Referral;
pub use state::{ConversationState, EventKind};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{Response, Tally, Verdict, Vote, VoteState};
