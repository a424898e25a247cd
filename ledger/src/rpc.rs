//! JSON-RPC 2.0 client for the ledger signing gateway.
//!
//! The gateway holds the service's delegated posting keys and exposes the
//! handful of ledger calls the engine needs:
//!
//! | method | params |
//! |---|---|
//! | `get_content` | `{author, permlink}` |
//! | `get_account` | `{name}` |
//! | `vote` | `{voter, author, permlink, weight}` |
//! | `comment` | `{author, parent_author, parent_permlink, body}` |
//! | `transfer` | `{from, to, amount, memo}` |
//! | `transfer_to_vesting` | `{from, to, amount}` |

use crate::account::AccountInfo;
use crate::client::LedgerClient;
use crate::content::ContentInfo;
use crate::error::LedgerError;
use async_trait::async_trait;
use curator_types::Asset;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default timeout for a single ledger call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-RPC error code the gateway uses for missing posts and accounts.
const NOT_FOUND_CODE: i64 = -32004;

/// Ledger client speaking JSON-RPC 2.0 over HTTP.
pub struct RpcLedgerClient {
    endpoint: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcLedgerClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::trace!(method, id, "ledger call");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(LedgerError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(LedgerError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let envelope: RpcResponse = response.json().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("failed to parse {method} response: {e}"))
        })?;

        decode_result(method, envelope)
    }
}

fn decode_result<T: DeserializeOwned>(method: &str, envelope: RpcResponse) -> Result<T, LedgerError> {
    if let Some(err) = envelope.error {
        return Err(if err.code == NOT_FOUND_CODE {
            LedgerError::NotFound(err.message)
        } else {
            LedgerError::Rpc {
                code: err.code,
                message: err.message,
            }
        });
    }
    let result = envelope.result.unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| LedgerError::InvalidResponse(format!("unexpected {method} result: {e}")))
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_content(&self, author: &str, permalink: &str) -> Result<ContentInfo, LedgerError> {
        self.call("get_content", json!({ "author": author, "permlink": permalink }))
            .await
    }

    async fn get_account(&self, name: &str) -> Result<AccountInfo, LedgerError> {
        self.call("get_account", json!({ "name": name })).await
    }

    async fn submit_approval(
        &self,
        account: &str,
        author: &str,
        permalink: &str,
        weight: i32,
    ) -> Result<(), LedgerError> {
        let _: Value = self
            .call(
                "vote",
                json!({
                    "voter": account,
                    "author": author,
                    "permlink": permalink,
                    "weight": weight,
                }),
            )
            .await?;
        Ok(())
    }

    async fn post_comment(
        &self,
        author: &str,
        parent_author: &str,
        parent_permalink: &str,
        body: &str,
    ) -> Result<(), LedgerError> {
        let _: Value = self
            .call(
                "comment",
                json!({
                    "author": author,
                    "parent_author": parent_author,
                    "parent_permlink": parent_permalink,
                    "body": body,
                }),
            )
            .await?;
        Ok(())
    }

    async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
        memo: &str,
    ) -> Result<(), LedgerError> {
        let _: Value = self
            .call(
                "transfer",
                json!({ "from": from, "to": to, "amount": amount.to_string(), "memo": memo }),
            )
            .await?;
        Ok(())
    }

    async fn transfer_to_vesting(
        &self,
        from: &str,
        to: &str,
        amount: &Asset,
    ) -> Result<(), LedgerError> {
        let _: Value = self
            .call(
                "transfer_to_vesting",
                json!({ "from": from, "to": to, "amount": amount.to_string() }),
            )
            .await?;
        Ok(())
    }
}
