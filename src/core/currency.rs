//! Supported currency codes.
//!
//! The set is closed: a [`CurrencyCode`] can only be obtained through
//! [`CurrencyCode::parse`] (or its `FromStr`/serde equivalents), which trims,
//! uppercases and checks the raw input against the whitelist.

use crate::core::error::InvalidCurrency;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrencyCode {
    RUB,
    USD,
    EUR,
    JPY,
}

impl CurrencyCode {
    /// Every supported code, pivot first.
    pub const ALL: [CurrencyCode; 4] = [
        CurrencyCode::RUB,
        CurrencyCode::USD,
        CurrencyCode::EUR,
        CurrencyCode::JPY,
    ];

    /// Currency all stored rates are denominated in.
    pub const PIVOT: CurrencyCode = CurrencyCode::RUB;

    pub fn parse(raw: &str) -> Result<Self, InvalidCurrency> {
        match raw.trim().to_uppercase().as_str() {
            "RUB" => Ok(CurrencyCode::RUB),
            "USD" => Ok(CurrencyCode::USD),
            "EUR" => Ok(CurrencyCode::EUR),
            "JPY" => Ok(CurrencyCode::JPY),
            _ => Err(InvalidCurrency::new(raw)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyCode::RUB => "RUB",
            CurrencyCode::USD => "USD",
            CurrencyCode::EUR => "EUR",
            CurrencyCode::JPY => "JPY",
        }
    }

    /// Comma separated list of codes, as used in provider query strings.
    pub fn join(codes: &[CurrencyCode]) -> String {
        codes
            .iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = InvalidCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = InvalidCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.as_str().to_string()
    }
}
