pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Fetch,
    Historical { date: String, base: Option<String> },
    Rate { base: String, quote: String, json: bool },
    Rates,
    Watch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("pivotfx starting...");

    let config = match config_path {
        Some(path) => core::config::AppConfig::load_from_path(path)?,
        None => core::config::AppConfig::load()?,
    };
    debug!(
        pivot = %config.pivot,
        symbols = %core::CurrencyCode::join(&config.symbols),
        provider = %config.provider.base_url,
        "Loaded config"
    );

    let app = cli::App::open(config)?;

    match command {
        AppCommand::Fetch => cli::fetch::run(&app).await,
        AppCommand::Historical { date, base } => {
            cli::historical::run(&app, &date, base.as_deref()).await
        }
        AppCommand::Rate { base, quote, json } => cli::rate::run(&app, &base, &quote, json).await,
        AppCommand::Rates => cli::rates::run(&app).await,
        AppCommand::Watch => cli::watch::run(&app).await,
    }
}
