use crate::core::currency::CurrencyCode;
use crate::core::date::BusinessDate;
use crate::core::error::FetchError;
use crate::core::rate::{RatesProvider, RawRatesResponse};
use crate::providers::util::{MAX_BODY_BYTES, read_limited_body, status_error};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.currencyfreaks.com/v2.0";

/// Client for the CurrencyFreaks rates API.
///
/// Every request carries the client-wide timeout and reads at most
/// [`MAX_BODY_BYTES`] of the response.
pub struct CurrencyFreaksProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl CurrencyFreaksProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("pivotfx/0.1")
            .timeout(timeout)
            .build()?;
        Ok(CurrencyFreaksProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            client,
            max_body_bytes: MAX_BODY_BYTES,
        })
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn query(&self, base: CurrencyCode, symbols: &[CurrencyCode]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apikey", self.api_key.clone()),
            ("base", base.to_string()),
        ];
        if !symbols.is_empty() {
            params.push(("symbols", CurrencyCode::join(symbols)));
        }
        params
    }

    async fn get_rates(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<RawRatesResponse, FetchError> {
        let raw_url = format!("{}{}", self.base_url, endpoint);
        let url = reqwest::Url::parse_with_params(&raw_url, params).map_err(|e| {
            FetchError::InvalidUrl {
                url: raw_url.clone(),
                reason: e.to_string(),
            }
        })?;
        // The query string holds the api key, so only the path is logged.
        debug!("Requesting rates from {}", raw_url);

        let response = self.client.get(url).send().await?;
        debug!(status = %response.status(), "Received provider response");

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = read_limited_body(response, self.max_body_bytes).await?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}

#[async_trait]
impl RatesProvider for CurrencyFreaksProvider {
    #[instrument(name = "LatestRatesFetch", skip(self))]
    async fn fetch_latest(
        &self,
        base: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError> {
        let params = self.query(base, symbols);
        self.get_rates("/rates/latest", &params).await
    }

    #[instrument(name = "HistoricalRatesFetch", skip(self))]
    async fn fetch_historical(
        &self,
        date: BusinessDate,
        base: CurrencyCode,
        symbols: &[CurrencyCode],
    ) -> Result<RawRatesResponse, FetchError> {
        if date.is_zero() {
            return Err(FetchError::MissingDate);
        }

        let mut params = self.query(base, symbols);
        params.insert(1, ("date", date.format()));
        self.get_rates("/rates/historical", &params).await
    }
}
