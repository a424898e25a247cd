//! Content eligibility rules shared by submission and expiry.

use crate::error::Rejection;
use curator_ledger::{ContentInfo, LedgerClient, LedgerError};
use curator_types::{ContentRef, CurationParams};

/// Payout, tag and length checks on a fetched post, in that order.
pub fn content_rejection(content: &ContentInfo, params: &CurationParams) -> Option<Rejection> {
    if !content.payout_pending() {
        return Some(Rejection::PayoutFinished);
    }
    if content.payout_disabled() {
        return Some(Rejection::PayoutDisabled);
    }
    if params.censorship {
        if let Some(tag) = content.banned_tag(&params.banned_tags) {
            return Some(Rejection::BannedTag(tag.to_string()));
        }
    }
    if content.body_length() < params.min_post_length {
        return Some(Rejection::TooShort);
    }
    None
}

/// Whether the author is a community that curates itself.
pub fn community_rejection(author: &str, params: &CurationParams) -> Option<Rejection> {
    if params.ignore_excluded_communities
        && params.excluded_communities.iter().any(|c| c == author)
    {
        return Some(Rejection::ExcludedCommunity(author.to_string()));
    }
    None
}

/// Whether the post is still inside its payout window.
///
/// A ledger that cannot be reached counts as fresh; the next sweep checks again.
pub async fn is_fresh(ledger: &dyn LedgerClient, content: &ContentRef) -> bool {
    match ledger.get_content(&content.author, &content.permalink).await {
        Ok(info) => info.payout_pending(),
        Err(LedgerError::NotFound(_)) => false,
        Err(e) => {
            tracing::warn!(%content, error = %e, "freshness check failed, treating as fresh");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_ledger::PayoutState;
    use curator_nullables::NullLedger;
    use curator_types::Asset;

    fn params() -> CurationParams {
        CurationParams {
            min_post_length: 10,
            ..CurationParams::default()
        }
    }

    #[test]
    fn checks_run_in_order() {
        let mut content = NullLedger::fresh_content("alice", "p", 5);
        content.payout_state = PayoutState::Archived;
        content.max_accepted_payout = Asset::zero("GBG");
        assert_eq!(content_rejection(&content, &params()), Some(Rejection::PayoutFinished));

        content.payout_state = PayoutState::FirstPayout;
        assert_eq!(content_rejection(&content, &params()), Some(Rejection::PayoutDisabled));

        content.max_accepted_payout = Asset::from_milli(1, "GBG");
        assert_eq!(content_rejection(&content, &params()), Some(Rejection::TooShort));

        content.body = "long enough body".to_string();
        assert_eq!(content_rejection(&content, &params()), None);
    }

    #[test]
    fn banned_tags_only_apply_under_censorship() {
        let mut content = NullLedger::fresh_content("alice", "p", 50);
        content.tags = vec!["nsfw".to_string()];
        let mut params = params();
        params.banned_tags = vec!["nsfw".to_string()];
        assert_eq!(content_rejection(&content, &params), None);

        params.censorship = true;
        assert_eq!(
            content_rejection(&content, &params),
            Some(Rejection::BannedTag("nsfw".to_string()))
        );
    }

    #[test]
    fn excluded_community_respects_flag() {
        let mut params = params();
        assert!(community_rejection("vox-populi", &params).is_some());
        assert!(community_rejection("alice", &params).is_none());
        params.ignore_excluded_communities = false;
        assert!(community_rejection("vox-populi", &params).is_none());
    }

    #[tokio::test]
    async fn unreachable_ledger_counts_as_fresh() {
        let ledger = NullLedger::new();
        let post = ContentRef::new("alice", "p").unwrap();
        assert!(!is_fresh(&ledger, &post).await);

        ledger.set_unreachable(true);
        assert!(is_fresh(&ledger, &post).await);
    }
}
