//! Plagiarism screening of freshly opened votes and curator notification.

use crate::error::CurationError;
use curator_ledger::{prepare_text, CheckStatus, IntegrityChecker, SharedLedger};
use curator_messages::{Markup, Outbound, SharedVenue};
use curator_store::{CredentialStore, SharedStore, VoteStore};
use curator_types::{ChatId, CurationParams, Vote, VoteState};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to the content-integrity checker.
pub type SharedChecker = Arc<dyn IntegrityChecker>;

/// Number of badge images the checker serves.
const BADGE_IMAGES: i64 = 17;

/// Markdown badge linking a finished check's report.
fn uniqueness_badge(token: &str, image: i64) -> String {
    format!(
        "[![Uniqueness checked by TEXT.RU](https://text.ru/image/get/{token}/{image})](https://text.ru/antiplagiat/{token})"
    )
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScreenOutcome {
    /// Curators were asked to respond.
    Published { notified: usize },
    /// The text matched existing content and the vote was closed.
    Plagiarised { similarity: f64 },
    /// The vote was no longer open when the check finished.
    AlreadyClosed,
}

pub struct IntegrityScreen {
    store: SharedStore,
    ledger: SharedLedger,
    checker: Option<SharedChecker>,
    venue: SharedVenue,
    params: Arc<CurationParams>,
}

impl IntegrityScreen {
    pub fn new(
        store: SharedStore,
        ledger: SharedLedger,
        checker: Option<SharedChecker>,
        venue: SharedVenue,
        params: Arc<CurationParams>,
    ) -> Self {
        Self {
            store,
            ledger,
            checker,
            venue,
            params,
        }
    }

    /// Screen a freshly opened vote, then hand it to the curators.
    ///
    /// Checker failures and unfinished checks publish the vote anyway. A
    /// passed check is also answered on the post with the report badge.
    /// `skip_chat` is left out of the notification.
    pub async fn screen(
        &self,
        vote: &Vote,
        body: &str,
        skip_chat: Option<ChatId>,
    ) -> Result<ScreenOutcome, CurationError> {
        if let Some((similarity, token)) = self.similarity(vote, body).await {
            if similarity >= self.params.similarity_threshold {
                if !self.store.resolve(vote.id, VoteState::Completed, &[])? {
                    return Ok(ScreenOutcome::AlreadyClosed);
                }
                tracing::info!(vote = %vote.id, similarity, "vote closed as plagiarised");
                return Ok(ScreenOutcome::Plagiarised { similarity });
            }
            tracing::debug!(vote = %vote.id, similarity, "integrity check passed");
            self.post_badge(vote, &token).await;
        }
        let notified = self.notify_curators(vote, skip_chat).await?;
        Ok(ScreenOutcome::Published { notified })
    }

    /// Comment failures are logged and otherwise ignored.
    async fn post_badge(&self, vote: &Vote, token: &str) {
        let badge = uniqueness_badge(token, vote.id.get().rem_euclid(BADGE_IMAGES) + 1);
        if let Err(e) = self
            .ledger
            .post_comment(
                &self.params.service_account,
                &vote.content.author,
                &vote.content.permalink,
                &badge,
            )
            .await
        {
            tracing::warn!(vote = %vote.id, error = %e, "failed to post uniqueness badge");
        }
    }

    async fn similarity(&self, vote: &Vote, body: &str) -> Option<(f64, String)> {
        let checker = self.checker.as_ref()?;
        let text = prepare_text(body);
        if text.chars().count() < self.params.min_post_length {
            return None;
        }
        let token = match checker.submit_for_check(&text).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(vote = %vote.id, error = %e, "integrity check submission failed");
                return None;
            }
        };
        let interval = Duration::from_secs(self.params.integrity_poll_secs);
        for _ in 0..self.params.integrity_max_polls {
            tokio::time::sleep(interval).await;
            match checker.poll_result(&token).await {
                Ok(CheckStatus::Done(similarity)) => return Some((similarity, token)),
                Ok(CheckStatus::Pending) => {}
                Err(e) => {
                    tracing::warn!(vote = %vote.id, error = %e, "integrity poll failed");
                    return None;
                }
            }
        }
        tracing::warn!(vote = %vote.id, "integrity check did not finish in time");
        None
    }

    /// Send the vote with its response buttons to every active curator.
    pub async fn notify_curators(
        &self,
        vote: &Vote,
        skip_chat: Option<ChatId>,
    ) -> Result<usize, CurationError> {
        let text = format!(
            "New post to curate:\n{}",
            vote.content.link(&self.params.frontend_url)
        );
        let mut notified = 0;
        for curator in self.store.active_curators()? {
            if Some(curator.chat_id) == skip_chat {
                continue;
            }
            let message = Outbound::new(curator.chat_id, text.clone()).with_markup(Markup::vote(vote.id));
            match self.venue.send(message).await {
                Ok(()) => notified += 1,
                Err(e) => tracing::warn!(chat = %curator.chat_id, error = %e, "curator notification failed"),
            }
        }
        tracing::debug!(vote = %vote.id, notified, "curators notified");
        Ok(notified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_nullables::{NullChecker, NullLedger, NullStore, NullVenue};
    use curator_store::NewVote;
    use curator_types::{ContentRef, Credential, Timestamp, UserId};

    struct Fixture {
        store: Arc<NullStore>,
        ledger: Arc<NullLedger>,
        venue: Arc<NullVenue>,
        vote: Vote,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(NullStore::new());
        for id in 1..=3 {
            let mut credential =
                Credential::activated(UserId::new(id), ChatId::new(id), format!("curator{id}"));
            credential.curator = true;
            store.put_credential(&credential).unwrap();
        }
        let vote = store
            .insert_vote(&NewVote {
                content: ContentRef::new("author", "post").unwrap(),
                submitter: UserId::new(1),
                submitted_at: Timestamp::new(100),
                percent: 100,
            })
            .unwrap();
        Fixture {
            store,
            ledger: Arc::new(NullLedger::new()),
            venue: Arc::new(NullVenue::new()),
            vote,
        }
    }

    fn screen(f: &Fixture, checker: Option<SharedChecker>) -> IntegrityScreen {
        let params = CurationParams {
            integrity_poll_secs: 0,
            integrity_max_polls: 3,
            ..CurationParams::default()
        };
        IntegrityScreen::new(
            f.store.clone(),
            f.ledger.clone(),
            checker,
            f.venue.clone(),
            Arc::new(params),
        )
    }

    fn body() -> String {
        format!("<p>{}</p>", "word ".repeat(100))
    }

    #[tokio::test]
    async fn without_checker_curators_are_notified_except_submitter() {
        let f = fixture();
        let outcome = screen(&f, None)
            .screen(&f.vote, &body(), Some(ChatId::new(1)))
            .await
            .unwrap();

        assert_eq!(outcome, ScreenOutcome::Published { notified: 2 });
        let sent = f.venue.sent();
        assert!(sent.iter().all(|m| m.chat_id != ChatId::new(1)));
        assert!(sent.iter().all(|m| m.markup == Some(Markup::vote(f.vote.id))));
    }

    #[tokio::test]
    async fn plagiarised_text_closes_vote_without_notification() {
        let f = fixture();
        let checker = Arc::new(NullChecker::new(vec![
            CheckStatus::Pending,
            CheckStatus::Done(92.5),
        ]));

        let outcome = screen(&f, Some(checker.clone()))
            .screen(&f.vote, &body(), None)
            .await
            .unwrap();

        assert_eq!(outcome, ScreenOutcome::Plagiarised { similarity: 92.5 });
        assert_eq!(f.store.get_vote(f.vote.id).unwrap().state, VoteState::Completed);
        assert!(f.venue.sent().is_empty());
        assert!(f.ledger.comments().is_empty());
        assert_eq!(checker.submitted().len(), 1);
        assert!(!checker.submitted()[0].contains("<p>"));
    }

    #[tokio::test]
    async fn original_text_is_published() {
        let f = fixture();
        let checker = Arc::new(NullChecker::new(vec![CheckStatus::Done(10.0)]));

        let outcome = screen(&f, Some(checker)).screen(&f.vote, &body(), None).await.unwrap();

        assert_eq!(outcome, ScreenOutcome::Published { notified: 3 });
        assert_eq!(f.store.get_vote(f.vote.id).unwrap().state, VoteState::Open);

        let comments = f.ledger.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "golosovalochka");
        assert_eq!(comments[0].parent_author, "author");
        assert_eq!(comments[0].parent_permalink, "post");
        assert!(comments[0].body.contains("https://text.ru/antiplagiat/check-1"));
    }

    #[tokio::test]
    async fn badge_failure_still_publishes() {
        let f = fixture();
        f.ledger.fail_account("golosovalochka");
        let checker = Arc::new(NullChecker::new(vec![CheckStatus::Done(10.0)]));

        let outcome = screen(&f, Some(checker)).screen(&f.vote, &body(), None).await.unwrap();

        assert_eq!(outcome, ScreenOutcome::Published { notified: 3 });
        assert!(f.ledger.comments().is_empty());
    }

    #[tokio::test]
    async fn unfinished_or_failed_checks_publish() {
        let f = fixture();
        let pending = Arc::new(NullChecker::new(vec![]));
        let outcome = screen(&f, Some(pending)).screen(&f.vote, &body(), None).await.unwrap();
        assert_eq!(outcome, ScreenOutcome::Published { notified: 3 });

        let refusing = Arc::new(NullChecker::refusing());
        let outcome = screen(&f, Some(refusing)).screen(&f.vote, &body(), None).await.unwrap();
        assert_eq!(outcome, ScreenOutcome::Published { notified: 3 });
        assert!(f.ledger.comments().is_empty());
    }

    #[tokio::test]
    async fn short_text_skips_the_check() {
        let f = fixture();
        let checker = Arc::new(NullChecker::new(vec![CheckStatus::Done(100.0)]));

        screen(&f, Some(checker.clone()))
            .screen(&f.vote, "short", None)
            .await
            .unwrap();

        assert!(checker.submitted().is_empty());
    }
}
