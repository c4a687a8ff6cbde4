//! Error types for the rate engine.
//!
//! Value constructors fail with [`InvalidCurrency`] / [`InvalidDate`].
//! Infrastructure failures are [`StorageError`] and [`FetchError`];
//! [`PipelineError`] and [`ConversionError`] wrap them next to their own
//! business-rule variants so callers can tell the two apart.

use crate::core::currency::CurrencyCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported currency {raw:?}")]
pub struct InvalidCurrency {
    pub raw: String,
}

impl InvalidCurrency {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse date {raw:?}: {reason}")]
pub struct InvalidDate {
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("as_of_date is empty")]
    MissingDate,

    #[error("storage backend: {0}")]
    Backend(#[from] fjall::Error),

    #[error("encode stored rate: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("corrupt row {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("storage task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("date is empty")]
    MissingDate,

    #[error("invalid provider url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Carries no URL: the query string holds the api key.
    #[error("request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("provider http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("unmarshal response: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("latest rates: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid base {raw:?}")]
    InvalidBase { raw: String },

    #[error("provider answered for base {got}, requested {expected}")]
    BaseMismatch {
        expected: CurrencyCode,
        got: CurrencyCode,
    },

    #[error("invalid quote {raw:?}")]
    InvalidQuote { raw: String },

    #[error("invalid rate {base}/{quote}={raw:?}")]
    InvalidRate {
        base: CurrencyCode,
        quote: CurrencyCode,
        raw: String,
    },

    #[error("response carries no as-of date")]
    MissingDate,

    #[error("save rates: {0}")]
    Storage(#[from] StorageError),

    #[error("fetch and save did not finish within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.without_url())
    }
}

impl PipelineError {
    /// Whether the next scheduled cycle may reasonably succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch(_) | PipelineError::Storage(_) | PipelineError::Timeout(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("unsupported currency {0:?}")]
    UnsupportedCurrency(String),

    #[error("base and quote must be different, got {0} twice")]
    SameCurrency(CurrencyCode),

    #[error("latest rate {base}/{quote} not available")]
    RateNotAvailable {
        base: CurrencyCode,
        quote: CurrencyCode,
    },

    #[error("rate {base}/{quote} is zero, cannot divide")]
    DivisionByZero {
        base: CurrencyCode,
        quote: CurrencyCode,
    },

    #[error("rate {base}/{quote} is out of representable range")]
    Arithmetic {
        base: CurrencyCode,
        quote: CurrencyCode,
    },

    #[error("get latest rates: {0}")]
    Storage(#[from] StorageError),
}

impl ConversionError {
    /// Business-rule failures are caused by the request or by missing data
    /// and are never worth retrying; everything else is infrastructure.
    pub fn is_business(&self) -> bool {
        !matches!(self, ConversionError::Storage(_))
    }
}

impl From<InvalidCurrency> for ConversionError {
    fn from(err: InvalidCurrency) -> Self {
        ConversionError::UnsupportedCurrency(err.raw)
    }
}
