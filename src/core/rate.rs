//! Rate records and the two seams of the engine: where rates come from
//! ([`RatesProvider`]) and where the freshest one per pair is kept ([`RateStore`]).

use crate::core::currency::CurrencyCode;
use crate::core::date::BusinessDate;
use crate::core::error::{FetchError, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The current fact for one `(base, quote)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub as_of_date: BusinessDate,
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// A derived rate between any two supported currencies. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRate {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub rate: Decimal,
    #[serde(default, skip_serializing_if = "BusinessDate::is_zero")]
    pub date: BusinessDate,
}

impl PairRate {
    /// Copy with the rate rounded half away from zero to `dp` fractional digits.
    /// Meant for display only; conversions keep full precision.
    pub fn rounded(&self, dp: u32) -> PairRate {
        PairRate {
            rate: self
                .rate
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            ..self.clone()
        }
    }
}

/// Provider payload before validation. Codes and rates are kept as the raw
/// strings the provider sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRatesResponse {
    #[serde(default)]
    pub date: BusinessDate,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub rates: BTreeMap<String, String>,
}

#[async_trait]
pub trait RateStore: Send + Sync {
    /// Writes every `(base, quote)` in `rates` in one atomic batch, replacing
    /// whatever is stored for the pair. Entries with `quote == base` are skipped.
    async fn upsert_rates(
        &self,
        base: CurrencyCode,
        as_of: BusinessDate,
        rates: &HashMap<CurrencyCode, Decimal>,
    ) -> Result<(), StorageError>;

    /// Current row per requested quote, ordered by quote. An empty `quotes`
    /// means every quote stored under `base`. Missing pairs are omitted.
    async fn get_latest(
        &self,
        base: CurrencyCode,
        quotes: &[CurrencyCode],
    ) -> Result<Vec<RateQuote>, StorageError>;
}

#[async_trait]
pub trait RatesProvider: Send + Sync {
    async fn fetch_latest(
        &self,
        base: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError>;

    async fn fetch_historical(
        &self,
        date: BusinessDate,
        base: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError>;
}
