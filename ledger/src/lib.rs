//! External collaborators of the curation engine.
//!
//! - [`LedgerClient`]: reads posts and accounts, submits approvals and transfers.
//!   [`RpcLedgerClient`] speaks JSON-RPC 2.0 to a signing gateway that holds the
//!   delegated keys.
//! - [`IntegrityChecker`]: optional content-uniqueness service.
//!   [`TextRuChecker`] implements the form-encoded text.ru API.
//!
//! Signing and transport internals of the ledger live behind the gateway; this
//! crate only defines the contract and a thin client.

pub mod account;
pub mod client;
pub mod content;
pub mod error;
pub mod integrity;
pub mod rpc;

pub use account::AccountInfo;
pub use client::{LedgerClient, SharedLedger};
pub use content::{ContentInfo, PayoutState};
pub use error::LedgerError;
pub use integrity::{prepare_text, CheckStatus, IntegrityChecker, TextRuChecker};
pub use rpc::RpcLedgerClient;
