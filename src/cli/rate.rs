use super::{App, ui};
use crate::core::PairRate;
use anyhow::Result;

pub fn render_pair(pair: &PairRate) -> String {
    let line = format!(
        "1 {} = {} {}",
        ui::style_text(pair.base.as_str(), ui::StyleType::Label),
        ui::style_text(&pair.rate.to_string(), ui::StyleType::Value),
        ui::style_text(pair.quote.as_str(), ui::StyleType::Label),
    );
    if pair.date.is_zero() {
        line
    } else {
        format!(
            "{line} {}",
            ui::style_text(&format!("(as of {})", pair.date), ui::StyleType::Subtle)
        )
    }
}

/// Prints the stored-derived rate for `base`/`quote`, rounded for display.
pub async fn run(app: &App, base: &str, quote: &str, json: bool) -> Result<()> {
    let pair = app.converter().get_pair_rate_str(base, quote).await?;
    let shown = pair.rounded(app.config().display_precision);

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    } else {
        println!("{}", render_pair(&shown));
    }
    Ok(())
}
