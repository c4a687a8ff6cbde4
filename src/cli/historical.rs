use super::{App, ui};
use crate::core::pipeline::{ValidatedRates, validate_response};
use crate::core::{BusinessDate, CurrencyCode};
use anyhow::{Context, Result, bail};
use comfy_table::Cell;

pub fn render_historical(rates: &ValidatedRates) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Quote"),
        ui::header_cell(&format!("Rate (1 {})", rates.base)),
    ]);

    let mut rows: Vec<_> = rates.rates.iter().collect();
    rows.sort_by_key(|(quote, _)| **quote);
    for (quote, rate) in rows {
        table.add_row(vec![Cell::new(quote), ui::rate_cell(*rate)]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(
            &format!("Historical rates for {} on {}", rates.base, rates.as_of),
            ui::StyleType::Title
        ),
        table
    )
}

/// Shows provider rates for a past day. Nothing is written to the store.
pub async fn run(app: &App, date: &str, base: Option<&str>) -> Result<()> {
    let date: BusinessDate = date.parse()?;
    if date.is_zero() {
        bail!("a historical date is required");
    }
    let base = match base {
        Some(raw) => CurrencyCode::parse(raw)?,
        None => app.config().pivot,
    };
    let symbols: Vec<CurrencyCode> = CurrencyCode::ALL
        .into_iter()
        .filter(|code| *code != base)
        .collect();

    let pipeline = app.pipeline()?;
    let pb = ui::new_spinner(&format!("Fetching {base} rates for {date}..."));
    let result = pipeline.fetch_historical(date, base, &symbols).await;
    pb.finish_and_clear();

    let resp = result.with_context(|| format!("Failed to fetch historical rates for {date}"))?;
    let validated = validate_response(&resp, base)?;
    println!("{}", render_historical(&validated));
    Ok(())
}
