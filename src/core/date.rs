//! Calendar-day values without a time component.

use crate::core::error::InvalidDate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
// "2024-12-26 09:30:00+03"; the offset may also carry minutes or be "Z".
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%#z";
const NULL_LITERAL: &str = "null";

/// A business day as asserted by a rate provider.
///
/// The zero value stands for "no date" and is distinct from every real day.
/// It formats and serializes as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusinessDate(Option<NaiveDate>);

impl BusinessDate {
    pub const fn zero() -> Self {
        BusinessDate(None)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(|d| BusinessDate(Some(d)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0
    }

    /// Accepts `YYYY-MM-DD`, then `YYYY-MM-DD HH:MM:SS±ZZ` (converted to UTC
    /// before the time is dropped). Empty input and `null` give the zero value.
    pub fn parse(raw: &str) -> Result<Self, InvalidDate> {
        let s = raw.trim().trim_matches('"').trim();
        if s.is_empty() || s == NULL_LITERAL {
            return Ok(BusinessDate::zero());
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(BusinessDate(Some(date)));
        }

        let with_offset = match s.strip_suffix('Z') {
            Some(rest) => format!("{rest}+00"),
            None => s.to_string(),
        };
        DateTime::parse_from_str(&with_offset, DATE_TIME_FORMAT)
            .map(|ts| BusinessDate(Some(ts.with_timezone(&Utc).date_naive())))
            .map_err(|e| InvalidDate {
                raw: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// `YYYY-MM-DD`, or `null` for the zero value.
    pub fn format(&self) -> String {
        match self.0 {
            Some(date) => date.format(DATE_FORMAT).to_string(),
            None => NULL_LITERAL.to_string(),
        }
    }
}

impl From<NaiveDate> for BusinessDate {
    fn from(date: NaiveDate) -> Self {
        BusinessDate(Some(date))
    }
}

impl Display for BusinessDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for BusinessDate {
    type Err = InvalidDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusinessDate::parse(s)
    }
}

impl Serialize for BusinessDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for BusinessDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => BusinessDate::parse(&raw).map_err(serde::de::Error::custom),
            None => Ok(BusinessDate::zero()),
        }
    }
}
