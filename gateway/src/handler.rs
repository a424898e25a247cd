//! Routes inbound events to the engine and renders the replies.

use crate::action::{
    main_menu, Action, BUTTON_DELEGATE, CURATOR_CONFIRMATION,
};
use crate::error::GatewayError;
use crate::links::{encode_referral, LinkParser};
use curator_engine::{
    ActivationOutcome, CurationEngine, CuratorOutcome, PowerOutcome, ResponseOutcome,
    SettlementOutcome, SubmitOutcome,
};
use curator_messages::{Inbound, Markup, Outbound};
use curator_store::{ConversationStore, CredentialStore};
use curator_types::{
    Asset, ChatId, Clock, ContentRef, ConversationState, PowerPercent, UserId, Verdict, VoteId,
};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

/// Presentation settings of the private chat.
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    /// Chat handle used in invitation links.
    pub bot_name: String,
    /// Frontend domains whose post links are accepted.
    pub frontend_domains: Vec<String>,
    /// Contact shown when something goes wrong.
    pub developer: String,
}

/// Answer to an inline button press.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallbackAnswer {
    pub id: String,
    pub text: String,
}

/// Everything the gateway should send back for one event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub messages: Vec<Outbound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_answer: Option<CallbackAnswer>,
}

impl Reply {
    fn message(message: Outbound) -> Self {
        Self {
            messages: vec![message],
            callback_answer: None,
        }
    }
}

pub struct Gateway {
    engine: Arc<CurationEngine>,
    links: LinkParser,
    digits: Regex,
    settings: GatewaySettings,
    clock: Arc<dyn Clock>,
}

impl Gateway {
    pub fn new(
        engine: Arc<CurationEngine>,
        settings: GatewaySettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        let links = LinkParser::new(&settings.frontend_domains)?;
        let digits = Regex::new("[0-9]+").map_err(|e| GatewayError::InvalidDomain(e.to_string()))?;
        Ok(Self {
            engine,
            links,
            digits,
            settings,
            clock,
        })
    }

    /// Running total of approvals dispatched for completed votes.
    pub fn approvals_dispatched(&self) -> u64 {
        self.engine.tally().approvals_dispatched()
    }

    /// Handle one event. Ignored events produce an empty reply.
    pub async fn handle(&self, event: Inbound) -> Result<Reply, GatewayError> {
        let Some(action) = Action::resolve(&event, &self.links) else {
            tracing::debug!(chat = %event.chat_id, user = %event.user_id, "event ignored");
            return Ok(Reply::default());
        };
        tracing::debug!(user = %event.user_id, ?action, "handling action");

        let user = event.user_id;
        let chat = event.chat_id;
        let state = self.engine.store().conversation(user)?;
        let (text, next, markup) = match action {
            Action::Verdict {
                callback_id,
                vote_id,
                verdict,
            } => {
                let text = self.verdict(user, vote_id, verdict).await?;
                return Ok(Reply {
                    messages: Vec::new(),
                    callback_answer: Some(CallbackAnswer {
                        id: callback_id,
                        text,
                    }),
                });
            }
            Action::Start { referral } => {
                let text = self.start(user, event.first_name.as_deref(), referral)?;
                (text, ConversationState::Idle, None)
            }
            Action::Delegate => (
                format!(
                    "Add *{}* as a trusted posting account of your ledger account, \
                     then tell me your account name.",
                    self.engine.params().service_account
                ),
                ConversationState::AwaitingAccountName,
                None,
            ),
            Action::StopDelegating => {
                let text = if self.engine.activation().deactivate(user)? {
                    "Done, I will no longer use your account when curating posts."
                } else {
                    "Your account is not activated."
                };
                (text.to_string(), ConversationState::Idle, None)
            }
            Action::ConfigurePower => {
                if self.is_active(user)? {
                    (
                        "Enter the share of your voting power to delegate, from 1 to 100%."
                            .to_string(),
                        ConversationState::AwaitingPowerValue,
                        None,
                    )
                } else {
                    (self.delegate_first(), ConversationState::Idle, None)
                }
            }
            Action::Information => (self.information(user)?, ConversationState::Idle, None),
            Action::BecomeCurator => self.become_curator(user)?,
            Action::StopCurating => {
                let text = if self.engine.activation().leave_curator(user)? {
                    "You are no longer a curator. Come back whenever you like."
                } else {
                    "You cannot stop curating without being a curator."
                };
                (text.to_string(), ConversationState::Idle, None)
            }
            Action::Submit(content) => (self.submit(content, user, chat).await?, state, None),
            Action::FreeText(text) => self.free_text(user, chat, state, &text).await?,
        };

        if next != state {
            self.engine.store().put_conversation(user, next)?;
        }
        let message = Outbound::new(chat, text).with_markup(markup.unwrap_or_else(main_menu));
        Ok(Reply::message(message))
    }

    fn start(
        &self,
        user: UserId,
        first_name: Option<&str>,
        referral: Option<String>,
    ) -> Result<String, GatewayError> {
        if let Some(referrer) = referral {
            self.engine.referrals().register(user, &referrer)?;
        }
        Ok(format!(
            "Hi, {}!\n\nI run collective curation of posts on the ledger. \
             Start by pressing \"{BUTTON_DELEGATE}\".\n\nQuestions go to {}.",
            first_name.unwrap_or("there"),
            self.settings.developer
        ))
    }

    fn information(&self, user: UserId) -> Result<String, GatewayError> {
        let Some(credential) = self.engine.store().get_credential(user)?.filter(|c| c.active) else {
            return Ok("I have no information for you yet.".to_string());
        };
        let params = self.engine.params();
        let link = format!(
            "https://t.me/{}?start={}",
            self.settings.bot_name,
            encode_referral(&credential.account)
        );
        let fee = Asset::from_milli(params.referral_fee_milli, &params.vesting_symbol);
        Ok(format!(
            "Account: *{}*\nDelegated power: *{}%*\nRating: *{}*\nInvitation link: {link}\n\
             (a successful invitation gives both of you {fee})",
            credential.account,
            credential.power.get(),
            credential.rating,
        ))
    }

    fn become_curator(
        &self,
        user: UserId,
    ) -> Result<(String, ConversationState, Option<Markup>), GatewayError> {
        let credential = self.engine.store().get_credential(user)?;
        Ok(match credential {
            Some(c) if c.is_active_curator() => (
                "You are already a curator.".to_string(),
                ConversationState::Idle,
                None,
            ),
            Some(c) if c.active => (
                format!(
                    "Curation rules: judge every post on its merits, never respond \
                     twice and keep your rating above zero.\n\nReply \"{CURATOR_CONFIRMATION}\" \
                     to continue."
                ),
                ConversationState::AwaitingCuratorConfirmation,
                Some(Markup::Menu {
                    rows: vec![vec![CURATOR_CONFIRMATION.to_string()]],
                }),
            ),
            _ => (self.delegate_first(), ConversationState::Idle, None),
        })
    }

    async fn submit(
        &self,
        content: ContentRef,
        user: UserId,
        chat: ChatId,
    ) -> Result<String, GatewayError> {
        let now = self.clock.now();
        match self.engine.gate().submit(content, user, now).await? {
            SubmitOutcome::Rejected(rejection) => Ok(rejection.to_string()),
            SubmitOutcome::Opened { vote, content, .. } => {
                let screen = Arc::clone(self.engine.screen());
                let reply = format!("Vote #{} is open. Curators will look at it shortly.", vote.id);
                tokio::spawn(async move {
                    if let Err(e) = screen.screen(&vote, &content.body, Some(chat)).await {
                        tracing::warn!(vote = %vote.id, error = %e, "screening failed");
                    }
                });
                Ok(reply)
            }
        }
    }

    async fn free_text(
        &self,
        user: UserId,
        chat: ChatId,
        state: ConversationState,
        text: &str,
    ) -> Result<(String, ConversationState, Option<Markup>), GatewayError> {
        match state {
            ConversationState::Idle => Ok((
                "I don't understand.".to_string(),
                ConversationState::Idle,
                None,
            )),
            ConversationState::AwaitingAccountName => {
                let outcome = self.engine.activation().activate(user, chat, text).await?;
                Ok(activation_reply(outcome, &self.settings.developer))
            }
            ConversationState::AwaitingPowerValue => {
                let Some(power) = self.parse_power(text) else {
                    return Ok((
                        "I didn't get that. Enter a value from 1 to 100%.".to_string(),
                        state,
                        None,
                    ));
                };
                let text = match self.engine.activation().set_power(user, power).await? {
                    PowerOutcome::Updated(power) => {
                        format!("Your delegated voting power is now *{}%*.", power.get())
                    }
                    PowerOutcome::NotActive => self.delegate_first(),
                    PowerOutcome::InsufficientVesting => {
                        "Your voting power is still too small for this.".to_string()
                    }
                };
                Ok((text, ConversationState::Idle, None))
            }
            ConversationState::AwaitingCuratorConfirmation => {
                if text != CURATOR_CONFIRMATION {
                    return Ok((
                        format!("Reply \"{CURATOR_CONFIRMATION}\" to become a curator."),
                        state,
                        None,
                    ));
                }
                let text = match self.engine.activation().enroll_curator(user, chat)? {
                    CuratorOutcome::Enrolled => "Great, you can now curate posts.".to_string(),
                    CuratorOutcome::AlreadyCurator => "You are already a curator.".to_string(),
                    CuratorOutcome::NotActive => self.delegate_first(),
                };
                Ok((text, ConversationState::Idle, None))
            }
        }
    }

    async fn verdict(
        &self,
        user: UserId,
        vote_id: VoteId,
        verdict: Verdict,
    ) -> Result<String, GatewayError> {
        let now = self.clock.now();
        let outcome = self
            .engine
            .tally()
            .record_response(vote_id, user, verdict, now)
            .await?;
        Ok(match outcome {
            ResponseOutcome::Recorded { .. } => "Response accepted".to_string(),
            ResponseOutcome::Duplicate { .. } => "You have already responded to this post".to_string(),
            ResponseOutcome::NotCurator => "Only curators can respond".to_string(),
            ResponseOutcome::RatingTooLow { rating } => {
                format!("Your curator rating {rating} is too low to respond")
            }
            ResponseOutcome::UnknownVote => "This vote does not exist".to_string(),
            ResponseOutcome::VoteClosed => "Voting on this post is closed".to_string(),
        })
    }

    /// The first number in `text`, if it is a valid power percentage.
    fn parse_power(&self, text: &str) -> Option<PowerPercent> {
        let value: i64 = self.digits.find(text)?.as_str().parse().ok()?;
        PowerPercent::new(value).ok()
    }

    fn is_active(&self, user: UserId) -> Result<bool, GatewayError> {
        Ok(self
            .engine
            .store()
            .get_credential(user)?
            .is_some_and(|c| c.active))
    }

    fn delegate_first(&self) -> String {
        format!("Delegate your account first with the \"{BUTTON_DELEGATE}\" button.")
    }
}

fn activation_reply(
    outcome: ActivationOutcome,
    developer: &str,
) -> (String, ConversationState, Option<Markup>) {
    match outcome {
        ActivationOutcome::Activated { account, referral } => {
            let mut text = format!(
                "Account *{account}* is active. I will vote with it on the posts the curators approve."
            );
            if referral == Some(SettlementOutcome::Paid) {
                text.push_str("\nYou and your referrer received the invitation reward.");
            }
            (text, ConversationState::Idle, None)
        }
        ActivationOutcome::NotDelegated { account } => (
            format!("Account *{account}* has not granted me posting authority yet. Try again once it has."),
            ConversationState::AwaitingAccountName,
            None,
        ),
        ActivationOutcome::AccountNotFound { account } => (
            format!("Account *{account}* does not exist. Check the name and try again."),
            ConversationState::AwaitingAccountName,
            None,
        ),
        ActivationOutcome::AccountTaken { account } => (
            format!("Account *{account}* is already used by someone else. Contact {developer} if it is yours."),
            ConversationState::Idle,
            None,
        ),
    }
}
