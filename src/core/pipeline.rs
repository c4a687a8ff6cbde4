//! Provider → validation → storage.

use crate::core::currency::CurrencyCode;
use crate::core::date::BusinessDate;
use crate::core::error::{FetchError, PipelineError};
use crate::core::rate::{RateStore, RatesProvider, RawRatesResponse};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Outer bound on one fetch-and-save cycle, storage included.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A provider response that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRates {
    pub base: CurrencyCode,
    pub as_of: BusinessDate,
    pub rates: HashMap<CurrencyCode, Decimal>,
}

/// Checks every field of a provider response. One bad entry rejects the
/// whole response.
pub fn validate_response(
    resp: &RawRatesResponse,
    expected_base: CurrencyCode,
) -> Result<ValidatedRates, PipelineError> {
    let base = CurrencyCode::parse(&resp.base).map_err(|e| PipelineError::InvalidBase { raw: e.raw })?;
    if base != expected_base {
        return Err(PipelineError::BaseMismatch {
            expected: expected_base,
            got: base,
        });
    }
    if resp.date.is_zero() {
        return Err(PipelineError::MissingDate);
    }

    let mut rates = HashMap::with_capacity(resp.rates.len());
    for (raw_quote, raw_rate) in &resp.rates {
        let quote =
            CurrencyCode::parse(raw_quote).map_err(|e| PipelineError::InvalidQuote { raw: e.raw })?;
        let rate = parse_rate(raw_rate).ok_or_else(|| PipelineError::InvalidRate {
            base,
            quote,
            raw: raw_rate.clone(),
        })?;
        rates.insert(quote, rate);
    }

    Ok(ValidatedRates {
        base,
        as_of: resp.date,
        rates,
    })
}

fn parse_rate(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let rate = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()?;
    (!rate.is_sign_negative() || rate.is_zero()).then_some(rate)
}

pub struct RatePipeline {
    provider: Arc<dyn RatesProvider>,
    store: Arc<dyn RateStore>,
    timeout: Duration,
}

impl RatePipeline {
    pub fn new(provider: Arc<dyn RatesProvider>, store: Arc<dyn RateStore>) -> Self {
        Self {
            provider,
            store,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_latest(
        &self,
        pivot: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError> {
        self.provider.fetch_latest(pivot, symbols).await
    }

    pub async fn fetch_historical(
        &self,
        date: BusinessDate,
        pivot: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError> {
        self.provider.fetch_historical(date, pivot, symbols).await
    }

    /// Fetches the latest pivot-denominated rates, validates them and upserts
    /// them in one batch, all within the pipeline timeout.
    #[instrument(name = "FetchAndSave", skip(self))]
    pub async fn fetch_and_save(
        &self,
        pivot: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, PipelineError> {
        tokio::time::timeout(self.timeout, self.fetch_validate_save(pivot, symbols))
            .await
            .map_err(|_| PipelineError::Timeout(self.timeout))?
    }

    async fn fetch_validate_save(
        &self,
        pivot: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, PipelineError> {
        let resp = self.provider.fetch_latest(pivot, symbols).await?;
        let validated = validate_response(&resp, pivot)?;
        debug!(count = validated.rates.len(), "Validated provider rates");

        self.store
            .upsert_rates(validated.base, validated.as_of, &validated.rates)
            .await?;
        info!(base = %validated.base, date = %validated.as_of, "Rates updated");
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRateStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct StaticProvider {
        response: RawRatesResponse,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl RatesProvider for StaticProvider {
        async fn fetch_latest(
            &self,
            _base: CurrencyCode,
            _symbols: &[CurrencyCode],
        ) -> Result<RawRatesResponse, FetchError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.response.clone())
        }

        async fn fetch_historical(
            &self,
            date: BusinessDate,
            _base: CurrencyCode,
            _symbols: &[CurrencyCode],
        ) -> Result<RawRatesResponse, FetchError> {
            if date.is_zero() {
                return Err(FetchError::MissingDate);
            }
            Ok(self.response.clone())
        }
    }

    fn response(base: &str, date: &str, rates: &[(&str, &str)]) -> RawRatesResponse {
        RawRatesResponse {
            date: BusinessDate::parse(date).unwrap(),
            base: base.to_string(),
            rates: rates
                .iter()
                .map(|(q, r)| (q.to_string(), r.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn pipeline(resp: RawRatesResponse) -> (RatePipeline, Arc<MemoryRateStore>) {
        let store = Arc::new(MemoryRateStore::new());
        let provider = Arc::new(StaticProvider {
            response: resp,
            delay: None,
        });
        (RatePipeline::new(provider, store.clone()), store)
    }

    const SYMBOLS: [CurrencyCode; 2] = [CurrencyCode::USD, CurrencyCode::EUR];

    #[test]
    fn test_validate_normalizes_codes_and_rates() {
        let resp = response("rub", "2024-12-26", &[(" usd", " 0.0105 "), ("EUR", "9.5E-3")]);
        let validated = validate_response(&resp, CurrencyCode::RUB).unwrap();
        assert_eq!(validated.base, CurrencyCode::RUB);
        assert_eq!(validated.rates[&CurrencyCode::USD].to_string(), "0.0105");
        assert_eq!(validated.rates[&CurrencyCode::EUR], Decimal::from_str("0.0095").unwrap());
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let resp = response("RUB", "2024-12-26", &[("USD", "0.0105"), ("BTC", "0.0000001")]);
        assert!(matches!(
            validate_response(&resp, CurrencyCode::RUB),
            Err(PipelineError::InvalidQuote { ref raw }) if raw == "BTC"
        ));

        for bad in ["", "abc", "NaN", "inf", "-0.01"] {
            let resp = response("RUB", "2024-12-26", &[("USD", bad)]);
            assert!(
                matches!(
                    validate_response(&resp, CurrencyCode::RUB),
                    Err(PipelineError::InvalidRate { .. })
                ),
                "rate {bad:?} should be rejected"
            );
        }

        let resp = response("XXX", "2024-12-26", &[("USD", "0.0105")]);
        assert!(matches!(
            validate_response(&resp, CurrencyCode::RUB),
            Err(PipelineError::InvalidBase { .. })
        ));

        let resp = response("USD", "2024-12-26", &[("EUR", "0.9")]);
        assert!(matches!(
            validate_response(&resp, CurrencyCode::RUB),
            Err(PipelineError::BaseMismatch { .. })
        ));

        let resp = response("RUB", "null", &[("USD", "0.0105")]);
        assert!(matches!(
            validate_response(&resp, CurrencyCode::RUB),
            Err(PipelineError::MissingDate)
        ));
    }

    #[test]
    fn test_validate_accepts_zero_rate() {
        let resp = response("RUB", "2024-12-26", &[("USD", "0")]);
        let validated = validate_response(&resp, CurrencyCode::RUB).unwrap();
        assert!(validated.rates[&CurrencyCode::USD].is_zero());
    }

    #[tokio::test]
    async fn test_fetch_and_save_persists_rates() {
        let (pipeline, store) = pipeline(response(
            "RUB",
            "2024-12-26 00:00:00+00",
            &[("USD", "0.0105"), ("EUR", "0.0095"), ("RUB", "1")],
        ));

        let resp = pipeline
            .fetch_and_save(CurrencyCode::RUB, &SYMBOLS)
            .await
            .unwrap();
        assert_eq!(resp.base, "RUB");
        assert_eq!(resp.rates.len(), 3);

        let rows = store.get_latest(CurrencyCode::RUB, &[]).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quote, CurrencyCode::USD);
        assert_eq!(rows[0].rate.to_string(), "0.0105");
        assert_eq!(rows[0].as_of_date, BusinessDate::from_ymd(2024, 12, 26).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_and_save_is_all_or_nothing() {
        let (pipeline, store) = pipeline(response(
            "RUB",
            "2024-12-26",
            &[("USD", "0.0105"), ("EUR", "not-a-number")],
        ));

        let err = pipeline
            .fetch_and_save(CurrencyCode::RUB, &SYMBOLS)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRate { quote: CurrencyCode::EUR, .. }));
        assert!(!err.is_transient());
        assert!(store.get_latest(CurrencyCode::RUB, &[]).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_and_save_times_out() {
        let store = Arc::new(MemoryRateStore::new());
        let provider = Arc::new(StaticProvider {
            response: response("RUB", "2024-12-26", &[("USD", "0.0105")]),
            delay: Some(Duration::from_secs(60)),
        });
        let pipeline = RatePipeline::new(provider, store.clone()).with_timeout(Duration::from_secs(10));

        let err = pipeline
            .fetch_and_save(CurrencyCode::RUB, &SYMBOLS)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_secs(10)));
        assert!(err.is_transient());
        assert!(store.get_latest(CurrencyCode::RUB, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_historical_passthrough() {
        let (pipeline, store) = pipeline(response("RUB", "2024-12-25", &[("USD", "0.0103")]));

        let resp = pipeline
            .fetch_historical(
                BusinessDate::from_ymd(2024, 12, 25).unwrap(),
                CurrencyCode::RUB,
                &SYMBOLS,
            )
            .await
            .unwrap();
        assert_eq!(resp.rates["USD"], "0.0103");
        // Historical fetches are not persisted.
        assert!(store.get_latest(CurrencyCode::RUB, &[]).await.unwrap().is_empty());
    }
}
