use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("store error: {0}")]
    Store(#[from] curator_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] curator_ledger::LedgerError),

    #[error("venue error: {0}")]
    Venue(#[from] curator_messages::MessageError),

    #[error("{0}")]
    Other(String),
}

/// Why a submission was turned down. Never an error: nothing was written.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("This post has already been submitted.")]
    AlreadySubmitted,

    #[error("Too little time has passed since your last submission. Try again in {}.", wait_text(.remaining_secs))]
    Cooldown { remaining_secs: u64 },

    #[error("Too many votes are open right now. Wait until some of them are resolved.")]
    TooManyOpenVotes,

    #[error("This post was not found on the ledger.")]
    ContentNotFound,

    #[error("The payout for this post has already happened. Got something fresher?")]
    PayoutFinished,

    #[error("Payouts are disabled for this post.")]
    PayoutDisabled,

    #[error("Posts tagged {0} cannot be submitted.")]
    BannedTag(String),

    #[error("The post is too short.")]
    TooShort,

    #[error("Only users with an active delegation can submit posts.")]
    NotActive,

    #[error("Posts of {0} are supported by their own community.")]
    ExcludedCommunity(String),
}

fn wait_text(secs: &u64) -> String {
    let minutes = secs.div_ceil(60);
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_message_rounds_up_to_minutes() {
        let text = Rejection::Cooldown { remaining_secs: 61 }.to_string();
        assert!(text.contains("2m"), "{text}");
        let text = Rejection::Cooldown { remaining_secs: 3_900 }.to_string();
        assert!(text.contains("1h 5m"), "{text}");
    }
}
