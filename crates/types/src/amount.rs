//! Unsigned 64-bit ledger amounts and their textual encodings.

use crate::{Reference, ReferenceError, AssetRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An absolute (smallest-unit) amount on the ledger.
///
/// Accepted text encodings, all lossless:
///
/// - decimal: `"1000"`
/// - hexadecimal: `"0x3E8"`, or exactly 16 hex digits (`"00000000000003E8"`)
/// - two 32-bit words, lower first: `"[1000, 0]"`
///
/// A digits-only string is always decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    pub const ZERO: Self = Amount(0);

    /// Raw value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Convert a whole-unit amount to absolute units for an asset of
    /// `divisibility` decimal places. `None` on overflow.
    pub fn from_relative(whole: u64, divisibility: u8) -> Option<Self> {
        10u64
            .checked_pow(u32::from(divisibility))
            .and_then(|scale| whole.checked_mul(scale))
            .map(Amount)
    }

    /// Lower and higher 32-bit words.
    pub fn to_words(&self) -> [u32; 2] {
        [self.0 as u32, (self.0 >> 32) as u32]
    }

    /// Parse any of the accepted encodings.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        let invalid = |reason: &'static str| AmountError::InvalidAmount {
            input: input.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("empty input"));
        }

        if let Some(inner) = trimmed.strip_prefix('[') {
            let inner = inner
                .strip_suffix(']')
                .ok_or_else(|| invalid("unterminated word array"))?;
            let words: Vec<&str> = inner.split(',').map(str::trim).collect();
            if words.len() != 2 {
                return Err(invalid("word array must hold exactly two words"));
            }
            let lower: u32 = words[0]
                .parse()
                .map_err(|_| invalid("word is not a 32-bit unsigned integer"))?;
            let higher: u32 = words[1]
                .parse()
                .map_err(|_| invalid("word is not a 32-bit unsigned integer"))?;
            return Ok(Amount((u64::from(higher) << 32) | u64::from(lower)));
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid("malformed hexadecimal"));
            }
            return u64::from_str_radix(hex, 16)
                .map(Amount)
                .map_err(|_| invalid("hexadecimal value exceeds 64 bits"));
        }

        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse::<u64>()
                .map(Amount)
                .map_err(|_| invalid("decimal value exceeds 64 bits"));
        }

        if trimmed.len() == 16 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return u64::from_str_radix(trimmed, 16)
                .map(Amount)
                .map_err(|_| invalid("malformed hexadecimal"));
        }

        Err(invalid("not a decimal, hexadecimal or word-array amount"))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value)
    }
}

/// Amount parse failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: &'static str },
}

/// A quantity of a specific asset (a "mosaic").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: AssetRef,
    pub amount: Amount,
}

impl AssetAmount {
    pub fn new(asset: AssetRef, amount: Amount) -> Self {
        Self { asset, amount }
    }

    /// Parse `"<amount> <asset reference>"`, e.g. `"1000 cat.currency"`.
    pub fn parse(input: &str) -> Result<Self, AssetAmountError> {
        let mut parts = input.split_whitespace();
        let (Some(amount), Some(asset), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AssetAmountError::Malformed(input.to_string()));
        };
        let amount = Amount::parse(amount)?;
        let asset = Reference::parse(asset)?.into_asset()?;
        Ok(Self { asset, amount })
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}

/// Failures parsing an `"<amount> <asset>"` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetAmountError {
    #[error("Expected \"<amount> <asset>\" (e.g. 1000 cat.currency), got {0:?}")]
    Malformed(String),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}
