use crate::core::currency::CurrencyCode;
use crate::core::date::BusinessDate;
use crate::core::error::StorageError;
use crate::core::rate::{RateQuote, RateStore};
use crate::store::select_latest;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type PairKey = (CurrencyCode, CurrencyCode);

/// In-memory rate table keyed by `(base, quote)`.
///
/// An upsert holds the write lock for the whole batch, so readers see either
/// all of it or none of it.
#[derive(Clone, Default)]
pub struct MemoryRateStore {
    inner: Arc<RwLock<HashMap<PairKey, RateQuote>>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn upsert_rates(
        &self,
        base: CurrencyCode,
        as_of: BusinessDate,
        rates: &HashMap<CurrencyCode, Decimal>,
    ) -> Result<(), StorageError> {
        if as_of.is_zero() {
            return Err(StorageError::MissingDate);
        }

        let fetched_at = Utc::now();
        let mut table = self.inner.write().await;
        for (&quote, &rate) in rates {
            if quote == base {
                continue;
            }
            table.insert(
                (base, quote),
                RateQuote {
                    base,
                    quote,
                    as_of_date: as_of,
                    rate,
                    fetched_at,
                },
            );
        }
        debug!(%base, %as_of, count = rates.len(), "Upserted rates in memory");
        Ok(())
    }

    async fn get_latest(
        &self,
        base: CurrencyCode,
        quotes: &[CurrencyCode],
    ) -> Result<Vec<RateQuote>, StorageError> {
        let table = self.inner.read().await;
        let rows = table.values().filter(|r| r.base == base).cloned();
        Ok(select_latest(base, quotes, rows))
    }
}
