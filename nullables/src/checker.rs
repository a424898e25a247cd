//! Nullable integrity checker: scripted poll results.

use async_trait::async_trait;
use curator_ledger::{CheckStatus, IntegrityChecker, LedgerError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A checker that answers polls from a script.
///
/// Once the script runs out, every poll reports `Pending`.
pub struct NullChecker {
    script: Mutex<VecDeque<CheckStatus>>,
    submitted: Mutex<Vec<String>>,
    refuse: bool,
}

impl NullChecker {
    pub fn new(script: Vec<CheckStatus>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            submitted: Mutex::new(Vec::new()),
            refuse: false,
        }
    }

    /// A checker whose submissions always fail.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Vec::new())
        }
    }

    /// Texts submitted so far.
    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntegrityChecker for NullChecker {
    async fn submit_for_check(&self, text: &str) -> Result<String, LedgerError> {
        if self.refuse {
            return Err(LedgerError::Other("checker refused".to_string()));
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(text.to_string());
        Ok(format!("check-{}", submitted.len()))
    }

    async fn poll_result(&self, _token: &str) -> Result<CheckStatus, LedgerError> {
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CheckStatus::Pending))
    }
}
