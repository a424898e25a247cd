//! Small persisted state enums: per-user conversation state and cadence events.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the next free-text message of a user means.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationState {
    /// Free text carries no pending meaning.
    #[default]
    Idle,
    /// The user was asked for their ledger account name.
    AwaitingAccountName,
    /// The user was asked for a delegated power percentage.
    AwaitingPowerValue,
    /// The user was shown the curator rules and must confirm them.
    AwaitingCuratorConfirmation,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingAccountName => "awaiting_account_name",
            Self::AwaitingPowerValue => "awaiting_power_value",
            Self::AwaitingCuratorConfirmation => "awaiting_curator_confirmation",
        }
    }
}

impl FromStr for ConversationState {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "awaiting_account_name" => Ok(Self::AwaitingAccountName),
            "awaiting_power_value" => Ok(Self::AwaitingPowerValue),
            "awaiting_curator_confirmation" => Ok(Self::AwaitingCuratorConfirmation),
            other => Err(TypesError::InvalidConversationState(other.to_string())),
        }
    }
}

/// Kinds of recurring events whose last occurrence drives a cadence loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Curator rewards were paid out.
    Reward,
    /// The supported-posts report was published.
    Report,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reward => "REWARD",
            Self::Report => "POST",
        }
    }
}

impl FromStr for EventKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REWARD" => Ok(Self::Reward),
            "POST" => Ok(Self::Report),
            other => Err(TypesError::InvalidEventKind(other.to_string())),
        }
    }
}
