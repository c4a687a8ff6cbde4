use super::{App, ui};
use crate::core::RateQuote;
use crate::core::rate::RateStore;
use anyhow::Result;
use comfy_table::Cell;

pub fn render_quotes(title: &str, quotes: &[RateQuote]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Base"),
        ui::header_cell("Quote"),
        ui::header_cell("Rate"),
        ui::header_cell("As of"),
        ui::header_cell("Fetched at (UTC)"),
    ]);

    for q in quotes {
        table.add_row(vec![
            Cell::new(q.base),
            Cell::new(q.quote),
            ui::rate_cell(q.rate),
            Cell::new(q.as_of_date),
            Cell::new(q.fetched_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(title, ui::StyleType::Title),
        table
    )
}

/// Lists every stored rate for the configured pivot.
pub async fn run(app: &App) -> Result<()> {
    let pivot = app.config().pivot;
    let quotes = app.store().get_latest(pivot, &[]).await?;

    if quotes.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No {pivot} rates stored yet. Run `pivotfx fetch` first."),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!("{}", render_quotes(&format!("Stored rates ({pivot})"), &quotes));
    Ok(())
}
