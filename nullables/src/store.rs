//! Nullable store: thread-safe in-memory storage for testing.
//!
//! Every table lives behind one mutex, so the check-and-set operations are
//! atomic exactly as in the SQLite backend.

use curator_store::{
    ConversationStore, CredentialStore, EventStore, NewVote, RatingChange, ReferralStore,
    ResponseStore, StoreError, VoteStore,
};
use curator_types::{
    ChatId, ContentRef, ConversationState, Credential, EventKind, PowerPercent, Referral, Response,
    Timestamp, UserId, Vote, VoteId, VoteState,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_vote_id: i64,
    votes: BTreeMap<i64, Vote>,
    responses: BTreeMap<(i64, i64), Response>,
    credentials: BTreeMap<i64, Credential>,
    referrals: HashMap<i64, Referral>,
    conversations: HashMap<i64, ConversationState>,
    events: Vec<(EventKind, Timestamp)>,
}

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    tables: Mutex<Tables>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_vote_id: 1,
                ..Tables::default()
            }),
        }
    }

    fn update_credential(&self, user: UserId, f: impl FnOnce(&mut Credential)) -> bool {
        match self.tables.lock().unwrap().credentials.get_mut(&user.get()) {
            Some(credential) => {
                f(credential);
                true
            }
            None => false,
        }
    }

    /// Number of vote rows, in any state.
    pub fn vote_count(&self) -> usize {
        self.tables.lock().unwrap().votes.len()
    }

    /// Overwrite a vote's state without the check-and-set, for arranging tests.
    pub fn force_state(&self, id: VoteId, state: VoteState) {
        if let Some(vote) = self.tables.lock().unwrap().votes.get_mut(&id.get()) {
            vote.state = state;
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_submission(mut votes: Vec<Vote>) -> Vec<Vote> {
    votes.sort_by_key(|v| (v.submitted_at, v.id.get()));
    votes
}

impl VoteStore for NullStore {
    fn insert_vote(&self, vote: &NewVote) -> Result<Vote, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.votes.values().any(|v| v.content == vote.content) {
            return Err(StoreError::Duplicate(vote.content.to_string()));
        }
        let id = tables.next_vote_id;
        tables.next_vote_id += 1;
        let stored = Vote {
            id: VoteId::new(id),
            content: vote.content.clone(),
            submitter: vote.submitter,
            submitted_at: vote.submitted_at,
            percent: vote.percent,
            state: VoteState::Open,
        };
        tables.votes.insert(id, stored.clone());
        Ok(stored)
    }

    fn get_vote(&self, id: VoteId) -> Result<Vote, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .votes
            .get(&id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("vote {id}")))
    }

    fn content_exists(&self, content: &ContentRef) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .values()
            .any(|v| &v.content == content))
    }

    fn last_vote_by(&self, submitter: UserId) -> Result<Option<Vote>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .values()
            .filter(|v| v.submitter == submitter)
            .max_by_key(|v| (v.submitted_at, v.id.get()))
            .cloned())
    }

    fn recent_resolved_by(&self, submitter: UserId, limit: usize) -> Result<Vec<Vote>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut votes: Vec<Vote> = tables
            .votes
            .values()
            .filter(|v| v.submitter == submitter && v.state.is_terminal())
            .cloned()
            .collect();
        votes.sort_by_key(|v| std::cmp::Reverse((v.submitted_at, v.id.get())));
        votes.truncate(limit);
        Ok(votes)
    }

    fn open_vote_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .votes
            .values()
            .filter(|v| v.state == VoteState::Open)
            .count() as u64)
    }

    fn open_votes(&self) -> Result<Vec<Vote>, StoreError> {
        self.votes_in_state_since(VoteState::Open, Timestamp::EPOCH)
    }

    fn oldest_open_vote(&self) -> Result<Option<Vote>, StoreError> {
        Ok(self.open_votes()?.into_iter().next())
    }

    fn votes_in_state_since(
        &self,
        state: VoteState,
        since: Timestamp,
    ) -> Result<Vec<Vote>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(sorted_by_submission(
            tables
                .votes
                .values()
                .filter(|v| v.state == state && v.submitted_at >= since)
                .cloned()
                .collect(),
        ))
    }

    fn resolve(
        &self,
        id: VoteId,
        to: VoteState,
        ratings: &[RatingChange],
    ) -> Result<bool, StoreError> {
        if !to.is_terminal() {
            return Err(StoreError::Backend(format!(
                "vote {id} cannot be resolved to {}",
                to.as_str()
            )));
        }
        let mut guard = self.tables.lock().unwrap();
        let tables = &mut *guard;
        let vote = tables
            .votes
            .get_mut(&id.get())
            .ok_or_else(|| StoreError::NotFound(format!("vote {id}")))?;
        if vote.state.is_terminal() {
            return Ok(false);
        }
        vote.state = to;
        for change in ratings {
            if let Some(credential) = tables.credentials.get_mut(&change.user.get()) {
                credential.rating += change.delta;
            }
        }
        Ok(true)
    }
}

impl ResponseStore for NullStore {
    fn insert_response(&self, response: &Response) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.votes.contains_key(&response.vote_id.get()) {
            return Err(StoreError::NotFound(format!("vote {}", response.vote_id)));
        }
        let key = (response.vote_id.get(), response.voter.get());
        if tables.responses.contains_key(&key) {
            return Ok(false);
        }
        tables.responses.insert(key, response.clone());
        Ok(true)
    }

    fn get_response(&self, vote: VoteId, voter: UserId) -> Result<Option<Response>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .responses
            .get(&(vote.get(), voter.get()))
            .cloned())
    }

    fn responses_for(&self, vote: VoteId) -> Result<Vec<Response>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .responses
            .values()
            .filter(|r| r.vote_id == vote)
            .cloned()
            .collect())
    }

    fn response_counts_since(&self, since: Timestamp) -> Result<Vec<(UserId, u64)>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut counts: BTreeMap<UserId, u64> = BTreeMap::new();
        for response in tables.responses.values().filter(|r| r.responded_at >= since) {
            *counts.entry(response.voter).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

impl CredentialStore for NullStore {
    fn get_credential(&self, user: UserId) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .credentials
            .get(&user.get())
            .cloned())
    }

    fn credential_by_account(&self, account: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .credentials
            .values()
            .find(|c| c.account == account)
            .cloned())
    }

    fn put_credential(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(holder) = tables
            .credentials
            .values()
            .find(|c| c.account == credential.account && c.user_id != credential.user_id)
        {
            return Err(StoreError::Duplicate(format!(
                "account {} is held by user {}",
                credential.account, holder.user_id
            )));
        }
        let mut stored = credential.clone();
        if let Some(existing) = tables.credentials.get(&credential.user_id.get()) {
            stored.rating = existing.rating;
        }
        tables.credentials.insert(credential.user_id.get(), stored);
        Ok(())
    }

    fn set_power(&self, user: UserId, power: PowerPercent) -> Result<bool, StoreError> {
        Ok(self.update_credential(user, |c| c.power = power))
    }

    fn set_active(&self, user: UserId, active: bool) -> Result<bool, StoreError> {
        Ok(self.update_credential(user, |c| c.active = active))
    }

    fn set_curator(
        &self,
        user: UserId,
        curator: bool,
        chat: Option<ChatId>,
    ) -> Result<bool, StoreError> {
        Ok(self.update_credential(user, |c| {
            c.curator = curator;
            if let Some(chat) = chat {
                c.chat_id = chat;
            }
        }))
    }

    fn active_credentials(&self) -> Result<Vec<Credential>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .credentials
            .values()
            .filter(|c| c.active)
            .cloned()
            .collect())
    }
}

impl ReferralStore for NullStore {
    fn put_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.referrals.contains_key(&referral.referred.get()) {
            return Err(StoreError::Duplicate(format!(
                "referral of {}",
                referral.referred
            )));
        }
        tables
            .referrals
            .insert(referral.referred.get(), referral.clone());
        Ok(())
    }

    fn get_referral(&self, referred: UserId) -> Result<Option<Referral>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .referrals
            .get(&referred.get())
            .cloned())
    }

    fn complete_referral(
        &self,
        referred: UserId,
        referred_account: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.referrals.get_mut(&referred.get()) {
            Some(referral) if !referral.completed => {
                referral.completed = true;
                referral.referred_account = Some(referred_account.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl ConversationStore for NullStore {
    fn conversation(&self, user: UserId) -> Result<ConversationState, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .conversations
            .get(&user.get())
            .copied()
            .unwrap_or_default())
    }

    fn put_conversation(&self, user: UserId, state: ConversationState) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .conversations
            .insert(user.get(), state);
        Ok(())
    }
}

impl EventStore for NullStore {
    fn last_event(&self, kind: EventKind) -> Result<Option<Timestamp>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, at)| *at)
            .max())
    }

    fn record_event(&self, kind: EventKind, at: Timestamp) -> Result<(), StoreError> {
        self.tables.lock().unwrap().events.push((kind, at));
        Ok(())
    }
}
