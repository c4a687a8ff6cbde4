use super::{App, rates::render_quotes, ui};
use crate::core::rate::RateStore;
use anyhow::{Context, Result};

/// Fetches the latest pivot rates once, stores them and prints what is now stored.
pub async fn run(app: &App) -> Result<()> {
    let config = app.config();
    let pipeline = app.pipeline()?;

    let pb = ui::new_spinner("Fetching rates...");
    let result = pipeline.fetch_and_save(config.pivot, &config.symbols).await;
    pb.finish_and_clear();

    let resp = result.context("Failed to fetch rates")?;
    let quotes = app
        .store()
        .get_latest(config.pivot, &config.symbols)
        .await?;

    println!(
        "{}",
        render_quotes(&format!("Rates for {} as of {}", config.pivot, resp.date), &quotes)
    );
    Ok(())
}
