use crate::core::currency::CurrencyCode;
use crate::core::date::BusinessDate;
use crate::core::error::StorageError;
use crate::core::rate::{RateQuote, RateStore};
use crate::store::select_latest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const RATE_PARTITION: &str = "currency_rate";

#[derive(Serialize, Deserialize)]
struct StoredRate {
    as_of_date: BusinessDate,
    rate: Decimal,
    fetched_at: DateTime<Utc>,
}

/// Persistent rate table on a fjall keyspace.
///
/// Rows live in the `currency_rate` partition under the key `BASE/QUOTE`, so
/// each pair holds exactly one row. An upsert is a single write batch: it is
/// committed as a whole or not at all. Readers share `batch_lock` with the
/// writer, so a read never observes half of a batch.
#[derive(Clone)]
pub struct FjallRateStore {
    keyspace: Keyspace,
    rates: PartitionHandle,
    batch_lock: Arc<RwLock<()>>,
}

impl FjallRateStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let keyspace = fjall::Config::new(path).open()?;
        let rates = keyspace.open_partition(RATE_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            rates,
            batch_lock: Arc::new(RwLock::new(())),
        })
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<RateQuote, StorageError> {
        let key = String::from_utf8_lossy(key).into_owned();
        let corrupt = |reason: String| StorageError::Corrupt {
            key: key.clone(),
            reason,
        };

        let (base, quote) = key
            .split_once('/')
            .ok_or_else(|| corrupt("key is not BASE/QUOTE".to_string()))?;
        let base = CurrencyCode::parse(base).map_err(|e| corrupt(format!("bad base_ccy: {e}")))?;
        let quote =
            CurrencyCode::parse(quote).map_err(|e| corrupt(format!("bad quote_ccy: {e}")))?;
        let stored: StoredRate =
            serde_json::from_slice(value).map_err(|e| corrupt(e.to_string()))?;

        Ok(RateQuote {
            base,
            quote,
            as_of_date: stored.as_of_date,
            rate: stored.rate,
            fetched_at: stored.fetched_at,
        })
    }
}

fn pair_key(base: CurrencyCode, quote: CurrencyCode) -> String {
    format!("{base}/{quote}")
}

#[async_trait]
impl RateStore for FjallRateStore {
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
        let mut rows = Vec::with_capacity(rates.len());
        for (&quote, &rate) in rates {
            if quote == base {
                continue;
            }
            let stored = StoredRate {
                as_of_date: as_of,
                rate,
                fetched_at,
            };
            rows.push((pair_key(base, quote), serde_json::to_vec(&stored)?));
        }
        let count = rows.len();

        // The guard moves into the blocking task, so it is released only after
        // the commit finishes even if this future is dropped.
        let guard = Arc::clone(&self.batch_lock).write_owned().await;
        let keyspace = self.keyspace.clone();
        let partition = self.rates.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let _guard = guard;
            let mut batch = keyspace.batch();
            for (key, value) in rows {
                batch.insert(&partition, key.as_bytes(), value);
            }
            batch.commit()?;
            keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })
        .await??;

        debug!(%base, %as_of, count, "Upserted rates");
        Ok(())
    }

    async fn get_latest(
        &self,
        base: CurrencyCode,
        quotes: &[CurrencyCode],
    ) -> Result<Vec<RateQuote>, StorageError> {
        let _guard = self.batch_lock.read().await;
        let mut rows = Vec::new();
        if quotes.is_empty() {
            for item in self.rates.prefix(format!("{base}/")) {
                let (key, value) = item?;
                rows.push(Self::decode(&key, &value)?);
            }
        } else {
            for &quote in quotes {
                if quote == base {
                    continue;
                }
                let key = pair_key(base, quote);
                if let Some(value) = self.rates.get(&key)? {
                    rows.push(Self::decode(key.as_bytes(), &value)?);
                }
            }
        }
        Ok(select_latest(base, quotes, rows))
    }
}
