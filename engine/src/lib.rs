//! The curation voting engine.
//!
//! A submitted post becomes an open [`Vote`](curator_types::Vote). Curators
//! answer it through the [`TallyEngine`]; once enough responses arrive the vote
//! is resolved exactly once, ratings move, and an accepted vote is fanned out
//! by the [`DispatchCoordinator`] as weighted approvals from every delegated
//! account. The [`ExpiryMonitor`] closes votes whose payout window has passed
//! and promotes early winners.
//!
//! Around that core:
//! - [`SubmissionGate`]: validates and opens votes.
//! - [`IntegrityScreen`]: optional plagiarism screen before curators see a vote.
//! - [`CredentialActivation`]: delegation lifecycle and the authority audit.
//! - [`ReferralSettlement`]: one-shot referral payouts.
//! - [`CurationRewards`] and [`SupportReport`]: weekly and daily cadences.

pub mod activation;
pub mod dispatch;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod integrity;
pub mod rating;
pub mod referral;
pub mod report;
pub mod rewards;
pub mod submission;
pub mod tally;

pub use activation::{
    normalize_account, ActivationOutcome, AuditSummary, CredentialActivation, CuratorOutcome,
    PowerOutcome,
};
pub use dispatch::{DispatchCoordinator, DispatchFailure, DispatchReport};
pub use engine::CurationEngine;
pub use error::{CurationError, Rejection};
pub use expiry::{ExpiryMonitor, SweepOutcome};
pub use integrity::{IntegrityScreen, ScreenOutcome, SharedChecker};
pub use rating::{RatingChanges, RatingLedger};
pub use referral::{ReferralSettlement, SettlementOutcome};
pub use report::SupportReport;
pub use rewards::{response_cost, CurationRewards, RewardSummary};
pub use submission::{cooldown_interval, SubmissionGate, SubmitOutcome};
pub use tally::{Resolution, ResponseOutcome, TallyEngine};
