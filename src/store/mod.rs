//! [`RateStore`](crate::core::rate::RateStore) implementations.

pub mod disk;
pub mod memory;

pub use disk::FjallRateStore;
pub use memory::MemoryRateStore;

use crate::core::currency::CurrencyCode;
use crate::core::rate::RateQuote;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Keeps one row per quote under `base`: the one with the greatest
/// `(as_of_date, fetched_at)`. Rows for `quote == base` and quotes outside a
/// non-empty `quotes` filter are dropped. Output is ordered by quote.
pub(crate) fn select_latest(
    base: CurrencyCode,
    quotes: &[CurrencyCode],
    rows: impl IntoIterator<Item = RateQuote>,
) -> Vec<RateQuote> {
    let mut latest: BTreeMap<CurrencyCode, RateQuote> = BTreeMap::new();
    for row in rows {
        if row.base != base || row.quote == base {
            continue;
        }
        if !quotes.is_empty() && !quotes.contains(&row.quote) {
            continue;
        }
        match latest.entry(row.quote) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if (row.as_of_date, row.fetched_at) > (current.as_of_date, current.fetched_at) {
                    slot.insert(row);
                }
            }
        }
    }
    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::date::BusinessDate;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn row(quote: CurrencyCode, day: u32, rate: i64, age_secs: i64) -> RateQuote {
        RateQuote {
            base: CurrencyCode::RUB,
            quote,
            as_of_date: BusinessDate::from_ymd(2024, 12, day).unwrap(),
            rate: Decimal::from(rate),
            fetched_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_picks_latest_as_of_then_fetched_at() {
        let rows = vec![
            row(CurrencyCode::USD, 25, 1, 0),
            row(CurrencyCode::USD, 26, 2, 100),
            row(CurrencyCode::USD, 26, 3, 10),
            row(CurrencyCode::EUR, 24, 4, 0),
        ];

        let latest = select_latest(CurrencyCode::RUB, &[], rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].quote, CurrencyCode::USD);
        assert_eq!(latest[0].rate, Decimal::from(3));
        assert_eq!(latest[1].quote, CurrencyCode::EUR);
    }

    #[test]
    fn test_filters_requested_quotes_and_base() {
        let mut self_pair = row(CurrencyCode::RUB, 26, 1, 0);
        self_pair.quote = CurrencyCode::RUB;
        let rows = vec![
            self_pair,
            row(CurrencyCode::USD, 26, 2, 0),
            row(CurrencyCode::EUR, 26, 3, 0),
        ];

        let latest = select_latest(
            CurrencyCode::RUB,
            &[CurrencyCode::EUR, CurrencyCode::JPY, CurrencyCode::RUB],
            rows,
        );
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].quote, CurrencyCode::EUR);
    }
}
