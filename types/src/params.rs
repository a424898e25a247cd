//! Curation parameters: every tunable of the voting engine.
//!
//! Passed by construction to each component; nothing reads ambient globals.

use serde::{Deserialize, Serialize};

/// All tunables of the curation engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationParams {
    // ── Tally ─────────────────────────────────────────────────────────────
    /// Minimum total responses before a vote is resolved.
    pub required_votes: u32,

    /// Curators at or below this rating may not respond.
    pub min_curator_rating: i64,

    // ── Submission ───────────────────────────────────────────────────────
    /// Maximum number of simultaneously open votes.
    pub max_open_votes: u32,

    /// Base cooldown between two submissions of the same user, in seconds.
    pub posting_interval_secs: u64,

    /// Number of the submitter's latest resolved votes weighed by the cooldown.
    pub history_window: u32,

    /// Minimum body length (characters) of a submitted post.
    pub min_post_length: usize,

    /// Whether banned tags are enforced.
    pub censorship: bool,

    /// Tags that make a post ineligible when censorship is on.
    pub banned_tags: Vec<String>,

    /// Whether posts by excluded communities are refused.
    pub ignore_excluded_communities: bool,

    /// Community accounts that curate themselves.
    pub excluded_communities: Vec<String>,

    // ── Ledger ───────────────────────────────────────────────────────────
    /// The service account that holds delegated posting authority.
    pub service_account: String,

    /// Fixed referral reward paid to both sides, in thousandths of `vesting_symbol`.
    pub referral_fee_milli: u64,

    /// Minimum post count of a newcomer before a referral pays out.
    pub referral_min_posts: u64,

    /// Symbol of the vesting-backed asset.
    pub vesting_symbol: String,

    /// Symbol of the liquid asset curators are rewarded in.
    pub reward_symbol: String,

    /// Voting power a user needs before lowering their delegated percentage.
    pub power_change_min_vesting: u64,

    // ── Dispatch ─────────────────────────────────────────────────────────
    /// Maximum number of approvals submitted concurrently.
    pub dispatch_concurrency: usize,

    /// Per-account submission timeout in seconds.
    pub dispatch_timeout_secs: u64,

    // ── Integrity ────────────────────────────────────────────────────────
    /// Similarity percentage at or above which a post is screened out.
    pub similarity_threshold: f64,

    /// Seconds between two integrity polls.
    pub integrity_poll_secs: u64,

    /// Maximum number of integrity polls before giving up.
    pub integrity_max_polls: u32,

    /// Public frontend used to render post links.
    pub frontend_url: String,
}

impl Default for CurationParams {
    fn default() -> Self {
        Self {
            required_votes: 3,
            min_curator_rating: -10,

            max_open_votes: 10,
            posting_interval_secs: 3600,
            history_window: 10,
            min_post_length: 250,
            censorship: false,
            banned_tags: Vec::new(),
            ignore_excluded_communities: true,
            excluded_communities: vec!["vox-populi".to_string()],

            service_account: "golosovalochka".to_string(),
            referral_fee_milli: 1_000,
            referral_min_posts: 30,
            vesting_symbol: "GOLOS".to_string(),
            reward_symbol: "GBG".to_string(),
            power_change_min_vesting: 1_000_000,

            dispatch_concurrency: 16,
            dispatch_timeout_secs: 30,

            similarity_threshold: 80.0,
            integrity_poll_secs: 15,
            integrity_max_polls: 50,
            frontend_url: "https://golos.io".to_string(),
        }
    }
}
