//! Delegated ledger credentials of users and curators.

use crate::error::TypesError;
use crate::ids::{ChatId, UserId};
use serde::{Deserialize, Serialize};

/// Share of an account's voting power delegated to the collective action, 1..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PowerPercent(u8);

impl PowerPercent {
    pub const FULL: Self = Self(100);

    pub fn new(percent: i64) -> Result<Self, TypesError> {
        if (1..=100).contains(&percent) {
            Ok(Self(percent as u8))
        } else {
            Err(TypesError::PowerOutOfRange(percent))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Ledger vote weight in basis points (100% = 10000).
    pub fn weight_bps(&self) -> i32 {
        i32::from(self.0) * 100
    }
}

impl TryFrom<i64> for PowerPercent {
    type Error = TypesError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PowerPercent> for i64 {
    fn from(value: PowerPercent) -> Self {
        i64::from(value.0)
    }
}

/// A user's delegated ledger authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub user_id: UserId,
    /// Private chat with the user, used for curator notifications.
    pub chat_id: ChatId,
    /// Ledger account name. Unique across credentials.
    pub account: String,
    pub power: PowerPercent,
    pub active: bool,
    pub curator: bool,
    /// Reputation score. Negative values remove the user from the venue.
    pub rating: i64,
}

impl Credential {
    /// A freshly activated credential with full power and neutral rating.
    pub fn activated(user_id: UserId, chat_id: ChatId, account: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            account: account.into(),
            power: PowerPercent::FULL,
            active: true,
            curator: false,
            rating: 0,
        }
    }

    pub fn is_active_curator(&self) -> bool {
        self.active && self.curator
    }
}
