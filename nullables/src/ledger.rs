//! Nullable ledger: scripted content and accounts, recorded side effects.

use async_trait::async_trait;
use curator_ledger::{AccountInfo, ContentInfo, LedgerClient, LedgerError, PayoutState};
use curator_types::Asset;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// An approval submitted through the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Approval {
    pub account: String,
    pub author: String,
    pub permalink: String,
    pub weight: i32,
}

/// A reply published through the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub parent_author: String,
    pub parent_permalink: String,
    pub body: String,
}

/// A liquid or vesting transfer submitted through the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Asset,
    pub memo: Option<String>,
    pub vesting: bool,
}

#[derive(Default)]
struct State {
    contents: HashMap<(String, String), ContentInfo>,
    accounts: HashMap<String, AccountInfo>,
    failing_accounts: HashSet<String>,
    hanging_accounts: HashSet<String>,
    unreachable: bool,
    approvals: Vec<Approval>,
    comments: Vec<Comment>,
    transfers: Vec<Transfer>,
}

/// A test ledger that records calls instead of broadcasting them.
pub struct NullLedger {
    state: Mutex<State>,
}

impl NullLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// A pending-payout post with `body_len` characters of body.
    pub fn fresh_content(author: &str, permalink: &str, body_len: usize) -> ContentInfo {
        ContentInfo {
            author: author.to_string(),
            permalink: permalink.to_string(),
            payout_state: PayoutState::FirstPayout,
            max_accepted_payout: Asset::from_milli(1_000_000_000, "GBG"),
            tags: Vec::new(),
            body: "x".repeat(body_len),
        }
    }

    /// An account that delegated to `service_account`.
    pub fn delegating_account(name: &str, service_account: &str) -> AccountInfo {
        AccountInfo {
            name: name.to_string(),
            posting_authorities: vec![service_account.to_string()],
            voting_power: 0,
            post_count: 0,
            balance: Asset::zero("GBG"),
        }
    }

    pub fn put_content(&self, content: ContentInfo) {
        let key = (content.author.clone(), content.permalink.clone());
        self.state.lock().unwrap().contents.insert(key, content);
    }

    pub fn put_account(&self, account: AccountInfo) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(account.name.clone(), account);
    }

    /// Make every write signed by or paying `account` fail.
    pub fn fail_account(&self, account: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_accounts
            .insert(account.to_string());
    }

    /// Make approvals from `account` never complete.
    pub fn hang_account(&self, account: &str) {
        self.state
            .lock()
            .unwrap()
            .hanging_accounts
            .insert(account.to_string());
    }

    /// Make every read fail as if the endpoint were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    pub fn approvals(&self) -> Vec<Approval> {
        self.state.lock().unwrap().approvals.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    fn check_writable(&self, account: &str) -> Result<(), LedgerError> {
        if self.state.lock().unwrap().failing_accounts.contains(account) {
            return Err(LedgerError::Rpc {
                code: -32000,
                message: format!("{account} rejected"),
            });
        }
        Ok(())
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn get_content(&self, author: &str, permalink: &str) -> Result<ContentInfo, LedgerError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(LedgerError::Unreachable("null ledger offline".to_string()));
        }
        state
            .contents
            .get(&(author.to_string(), permalink.to_string()))
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("{author}/{permalink}")))
    }

    async fn get_account(&self, name: &str) -> Result<AccountInfo, LedgerError> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(LedgerError::Unreachable("null ledger offline".to_string()));
        }
        state
            .accounts
            .get(name)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(name.to_string()))
    }

    async fn submit_approval(
        &self,
        account: &str,
        author: &str,
        permalink: &str,
        weight: i32,
    ) -> Result<(), LedgerError> {
        let hangs = self.state.lock().unwrap().hanging_accounts.contains(account);
        if hangs {
            std::future::pending::<()>().await;
        }
        self.check_writable(account)?;
        self.state.lock().unwrap().approvals.push(Approval {
            account: account.to_string(),
            author: author.to_string(),
            permalink: permalink.to_string(),
            weight,
        });
        Ok(())
    }

    async fn post_comment(
        &self,
        author: &str,
        parent_author: &str,
        parent_permalink: &str,
        body: &str,
    ) -> Result<(), LedgerError> {
        self.check_writable(author)?;
        self.state.lock().unwrap().comments.push(Comment {
            author: author.to_string(),
            parent_author: parent_author.to_string(),
            parent_permalink: parent_permalink.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError> {
        self.check_writable(to)?;
        self.state.lock().unwrap().transfers.push(Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.clone(),
            memo: Some(memo.to_string()),
            vesting: false,
        });
        Ok(())
    }

    async fn transfer_to_vesting(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
    ) -> Result<(), LedgerError> {
        self.check_writable(to)?;
        self.state.lock().unwrap().transfers.push(Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.clone(),
            memo: None,
            vesting: true,
        });
        Ok(())
    }
}
