//! Integer parsing and the gas/fee arithmetic.
//!
//! Amounts travel as decimal strings, optionally suffixed with a denomination
//! (`"850000000000axpriv"`). Everything here is exact integer math; the gas adjustment is kept
//! as a decimal fraction instead of a float.

use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Split `"123axpriv"` into `("123", "axpriv")`. The denomination may be empty.
pub fn split_denom(amount: &str) -> (&str, &str) {
    let amount = amount.trim();
    let end = amount
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(amount.len());
    amount.split_at(end)
}

/// Parse an unsigned amount, dropping any denomination suffix.
pub fn parse_amount(what: &str, amount: &str) -> Result<U256> {
    let (digits, denom) = split_denom(amount);
    if digits.is_empty() {
        return Err(Error::parse(what, format!("{amount:?} is not a number")));
    }
    if !denom.is_empty() && !is_denom(denom) {
        return Err(Error::parse(what, format!("{amount:?} has a malformed denomination")));
    }
    U256::from_str_radix(digits, 10).map_err(|e| Error::parse(what, e))
}

pub fn parse_u64(what: &str, value: &str) -> Result<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(what, format!("{value:?} is not an unsigned integer")));
    }
    value.parse::<u64>().map_err(|e| Error::parse(what, e))
}

/// `gas_limit * gas_price`, exact.
pub fn fee_amount(gas_limit: u64, gas_price: U256) -> Result<U256> {
    U256::from(gas_limit)
        .checked_mul(gas_price)
        .ok_or_else(|| {
            Error::InvalidRequest("fee amount overflows: gas limit times gas price".into())
        })
}

fn is_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}

/// Maximum number of fractional digits accepted in a gas adjustment.
const MAX_ADJUSTMENT_SCALE: u32 = 18;

/// A non-negative decimal multiplier, stored as `numerator / 10^scale`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasAdjustment {
    numerator: u128,
    scale: u32,
}

impl GasAdjustment {
    pub const ONE: GasAdjustment = GasAdjustment {
        numerator: 1,
        scale: 0,
    };

    /// `ceil(gas_used * self)`.
    pub fn apply(&self, gas_used: u64) -> Result<u64> {
        let overflow = || Error::parse("adjusted gas", "gas adjustment result overflows");
        let denominator = 10u128.pow(self.scale);
        let product = (gas_used as u128)
            .checked_mul(self.numerator)
            .ok_or_else(overflow)?;
        let adjusted = product.div_ceil(denominator);
        u64::try_from(adjusted).map_err(|_| overflow())
    }

    pub fn is_at_least_one(&self) -> bool {
        self.numerator >= 10u128.pow(self.scale)
    }
}

impl Default for GasAdjustment {
    fn default() -> Self {
        GasAdjustment {
            numerator: 175,
            scale: 2,
        }
    }
}

impl FromStr for GasAdjustment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::parse("gas adjustment", format!("{s:?} is not a decimal"));
        let s = s.trim();
        let (int, frac) = s.split_once('.').unwrap_or((s, ""));
        if int.is_empty() && frac.is_empty() {
            return Err(malformed());
        }
        if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let frac = frac.trim_end_matches('0');
        let scale = frac.len() as u32;
        if scale > MAX_ADJUSTMENT_SCALE {
            return Err(Error::parse(
                "gas adjustment",
                format!("{s:?} has more than {MAX_ADJUSTMENT_SCALE} decimals"),
            ));
        }

        let digits = format!("{int}{frac}");
        let numerator = if digits.is_empty() {
            0
        } else {
            digits.parse::<u128>().map_err(|e| Error::parse("gas adjustment", e))?
        };

        Ok(GasAdjustment { numerator, scale })
    }
}

impl fmt::Display for GasAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let denominator = 10u128.pow(self.scale);
        let int = self.numerator / denominator;
        if self.scale == 0 {
            return write!(f, "{int}");
        }
        let frac = self.numerator % denominator;
        write!(f, "{int}.{frac:0width$}", width = self.scale as usize)
    }
}

impl Serialize for GasAdjustment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GasAdjustment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
