//! Ledger asset amounts.
//!
//! Amounts are fixed-point integers in thousandths to avoid floating-point
//! errors. The ledger renders them as `"<int>.<3 digits> <SYMBOL>"`.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by every ledger asset.
pub const ASSET_PRECISION: u32 = 3;
const SCALE: u64 = 10u64.pow(ASSET_PRECISION);

/// An amount of a ledger asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    /// Amount in thousandths of a unit.
    milli: u64,
    symbol: String,
}

impl Asset {
    pub fn from_milli(milli: u64, symbol: impl Into<String>) -> Self {
        Self {
            milli,
            symbol: symbol.into(),
        }
    }

    pub fn zero(symbol: impl Into<String>) -> Self {
        Self::from_milli(0, symbol)
    }

    pub fn milli(&self) -> u64 {
        self.milli
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_zero(&self) -> bool {
        self.milli == 0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:03} {}",
            self.milli / SCALE,
            self.milli % SCALE,
            self.symbol
        )
    }
}

impl FromStr for Asset {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidAsset(s.to_string());
        let (amount, symbol) = s.trim().split_once(' ').ok_or_else(invalid)?;
        if symbol.is_empty() {
            return Err(invalid());
        }
        let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));
        if frac.len() > ASSET_PRECISION as usize {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac_milli = if frac.is_empty() {
            0
        } else {
            let digits: u64 = frac.parse().map_err(|_| invalid())?;
            digits * 10u64.pow(ASSET_PRECISION - frac.len() as u32)
        };
        let milli = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac_milli))
            .ok_or_else(invalid)?;
        Ok(Self::from_milli(milli, symbol.trim()))
    }
}

impl TryFrom<String> for Asset {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Asset> for String {
    fn from(value: Asset) -> Self {
        value.to_string()
    }
}
