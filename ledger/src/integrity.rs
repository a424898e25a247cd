//! Content-uniqueness checking.

use crate::error::LedgerError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Maximum number of characters sent for checking.
pub const MAX_CHECK_CHARS: usize = 2000;

const TEXT_RU_ENDPOINT: &str = "http://api.text.ru/post";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// text.ru reports an unfinished check with this error code.
const TEXT_RU_PENDING_CODE: i64 = 181;

/// Result of polling a submitted check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CheckStatus {
    Pending,
    /// Percentage of the text found elsewhere, 0..=100.
    Done(f64),
}

/// A service scoring how much of a text already exists elsewhere.
#[async_trait]
pub trait IntegrityChecker: Send + Sync {
    /// Submit `text` and return a token for polling.
    async fn submit_for_check(&self, text: &str) -> Result<String, LedgerError>;

    async fn poll_result(&self, token: &str) -> Result<CheckStatus, LedgerError>;
}

/// Strip HTML tags and truncate to [`MAX_CHECK_CHARS`] characters.
pub fn prepare_text(body: &str) -> String {
    let mut out = String::with_capacity(body.len().min(MAX_CHECK_CHARS * 4));
    let mut in_tag = false;
    let mut count = 0;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => {
                if count == MAX_CHECK_CHARS {
                    break;
                }
                out.push(c);
                count += 1;
            }
        }
    }
    out
}

/// Checker backed by the text.ru form-encoded API.
pub struct TextRuChecker {
    user_key: String,
    except_domain: Option<String>,
    endpoint: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TextRuReply {
    #[serde(default)]
    text_uid: Option<String>,
    #[serde(default)]
    text_unique: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_desc: Option<String>,
}

impl TextRuChecker {
    pub fn new(user_key: impl Into<String>, except_domain: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            user_key: user_key.into(),
            except_domain,
            endpoint: TEXT_RU_ENDPOINT.to_string(),
            http_client,
        }
    }

    /// Point the checker at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn post(&self, form: &[(&str, &str)]) -> Result<TextRuReply, LedgerError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .form(form)
            .send()
            .await
            .map_err(LedgerError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(LedgerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("failed to parse text.ru reply: {e}")))
    }
}

fn interpret_submit(reply: TextRuReply) -> Result<String, LedgerError> {
    match reply.text_uid {
        Some(uid) if !uid.is_empty() => Ok(uid),
        _ => Err(LedgerError::Other(format!(
            "text.ru refused the check: {}",
            reply.error_desc.unwrap_or_else(|| "no reason given".to_string())
        ))),
    }
}

fn interpret_poll(reply: TextRuReply) -> Result<CheckStatus, LedgerError> {
    if let Some(unique) = reply.text_unique {
        let unique: f64 = unique
            .trim()
            .parse()
            .map_err(|_| LedgerError::InvalidResponse(format!("bad uniqueness value {unique:?}")))?;
        return Ok(CheckStatus::Done((100.0 - unique).clamp(0.0, 100.0)));
    }
    match reply.error_code {
        Some(TEXT_RU_PENDING_CODE) | None => Ok(CheckStatus::Pending),
        Some(code) => Err(LedgerError::Rpc {
            code,
            message: reply.error_desc.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl IntegrityChecker for TextRuChecker {
    async fn submit_for_check(&self, text: &str) -> Result<String, LedgerError> {
        let mut form = vec![("text", text), ("userkey", self.user_key.as_str())];
        if let Some(domain) = &self.except_domain {
            form.push(("exceptdomain", domain.as_str()));
        }
        interpret_submit(self.post(&form).await?)
    }

    async fn poll_result(&self, token: &str) -> Result<CheckStatus, LedgerError> {
        let form = [("uid", token), ("userkey", self.user_key.as_str())];
        interpret_poll(self.post(&form).await?)
    }
}
