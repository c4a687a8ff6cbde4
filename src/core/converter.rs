//! Pair rates derived from pivot-denominated quotes.
//!
//! Only `(pivot, X)` rows are ever read. For any other pair the converter
//! inverts or divides those rows, always in `Decimal`:
//!
//! * `pivot -> X` is the stored rate as is,
//! * `X -> pivot` is `1 / rate(pivot, X)`,
//! * `A -> B` is `rate(pivot, B) / rate(pivot, A)`.

use crate::core::currency::CurrencyCode;
use crate::core::error::ConversionError;
use crate::core::rate::{PairRate, RateQuote, RateStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct RateConverter {
    store: Arc<dyn RateStore>,
    pivot: CurrencyCode,
}

impl RateConverter {
    pub fn new(store: Arc<dyn RateStore>) -> Self {
        Self::with_pivot(store, CurrencyCode::PIVOT)
    }

    pub fn with_pivot(store: Arc<dyn RateStore>, pivot: CurrencyCode) -> Self {
        Self { store, pivot }
    }

    pub fn pivot(&self) -> CurrencyCode {
        self.pivot
    }

    /// Validates raw codes before touching storage.
    pub async fn get_pair_rate_str(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<PairRate, ConversionError> {
        let base = CurrencyCode::parse(base)?;
        let quote = CurrencyCode::parse(quote)?;
        self.get_pair_rate(base, quote).await
    }

    #[instrument(name = "PairRate", skip(self), fields(pivot = %self.pivot))]
    pub async fn get_pair_rate(
        &self,
        base: CurrencyCode,
        quote: CurrencyCode,
    ) -> Result<PairRate, ConversionError> {
        if base == quote {
            return Err(ConversionError::SameCurrency(base));
        }

        if base == self.pivot {
            let row = self.latest_from_pivot(quote).await?;
            return Ok(PairRate {
                base,
                quote,
                rate: row.rate,
                date: row.as_of_date,
            });
        }

        if quote == self.pivot {
            let row = self.latest_from_pivot(base).await?;
            let rate = divide(Decimal::ONE, row.rate, self.pivot, base)?;
            return Ok(PairRate {
                base,
                quote,
                rate,
                date: row.as_of_date,
            });
        }

        let (base_row, quote_row) = futures::future::try_join(
            self.latest_from_pivot(base),
            self.latest_from_pivot(quote),
        )
        .await?;
        let rate = divide(quote_row.rate, base_row.rate, self.pivot, base)?;
        debug!(%rate, "Cross rate via {}", self.pivot);

        Ok(PairRate {
            base,
            quote,
            rate,
            date: base_row.as_of_date,
        })
    }

    async fn latest_from_pivot(&self, quote: CurrencyCode) -> Result<RateQuote, ConversionError> {
        let rows = self.store.get_latest(self.pivot, &[quote]).await?;
        rows.into_iter()
            .find(|r| r.quote == quote)
            .ok_or(ConversionError::RateNotAvailable {
                base: self.pivot,
                quote,
            })
    }
}

// `divisor` is rate(pivot, divisor_quote); a zero there is never inverted.
fn divide(
    dividend: Decimal,
    divisor: Decimal,
    pivot: CurrencyCode,
    divisor_quote: CurrencyCode,
) -> Result<Decimal, ConversionError> {
    if divisor.is_zero() {
        return Err(ConversionError::DivisionByZero {
            base: pivot,
            quote: divisor_quote,
        });
    }
    dividend
        .checked_div(divisor)
        .ok_or(ConversionError::Arithmetic {
            base: pivot,
            quote: divisor_quote,
        })
}
