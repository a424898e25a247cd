//! Daily summary of the posts the collective supported.

use crate::error::CurationError;
use curator_messages::SharedVenue;
use curator_store::{EventStore, ResponseStore, SharedStore, VoteStore};
use curator_types::{CurationParams, EventKind, Timestamp, Vote, VoteState};
use std::sync::Arc;

pub struct SupportReport {
    store: SharedStore,
    venue: SharedVenue,
    params: Arc<CurationParams>,
}

impl SupportReport {
    pub fn new(store: SharedStore, venue: SharedVenue, params: Arc<CurationParams>) -> Self {
        Self {
            store,
            venue,
            params,
        }
    }

    /// Announce the votes accepted since the previous report and record the run.
    ///
    /// Votes completed by the integrity screen carry no accepted tally and are
    /// left out.
    pub async fn publish(&self, now: Timestamp) -> Result<Vec<Vote>, CurationError> {
        let since = self
            .store
            .last_event(EventKind::Report)?
            .unwrap_or(Timestamp::EPOCH);
        let mut supported = Vec::new();
        for vote in self.store.votes_in_state_since(VoteState::Completed, since)? {
            if self.store.tally(vote.id)?.is_accepted() {
                supported.push(vote);
            }
        }

        if !supported.is_empty() {
            let text = self.render(&supported);
            if let Err(e) = self.venue.announce(&text).await {
                tracing::warn!(error = %e, "failed to announce support report");
            }
        }
        self.store.record_event(EventKind::Report, now)?;
        tracing::info!(supported = supported.len(), "support report published");
        Ok(supported)
    }

    fn render(&self, votes: &[Vote]) -> String {
        let mut text = format!("Posts supported since the last report: {}\n", votes.len());
        for vote in votes {
            text.push('\n');
            text.push_str(&vote.content.link(&self.params.frontend_url));
        }
        text
    }
}
