//! Terminal front end: one module per subcommand plus shared table styling.

pub mod fetch;
pub mod historical;
pub mod rate;
pub mod rates;
pub mod setup;
pub mod ui;
pub mod watch;

use crate::core::config::AppConfig;
use crate::core::{RateConverter, RatePipeline};
use crate::providers::CurrencyFreaksProvider;
use crate::store::FjallRateStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

/// Loaded configuration plus the opened rate store, shared by every command.
pub struct App {
    config: AppConfig,
    store: Arc<FjallRateStore>,
}

impl App {
    pub fn open(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        std::fs::create_dir_all(&data_path)
            .with_context(|| format!("Failed to create data directory: {}", data_path.display()))?;
        let store = FjallRateStore::open(&data_path)
            .with_context(|| format!("Failed to open rate store at {}", data_path.display()))?;
        debug!(path = %data_path.display(), "Opened rate store");

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<FjallRateStore> {
        Arc::clone(&self.store)
    }

    pub fn converter(&self) -> RateConverter {
        RateConverter::with_pivot(self.store(), self.config.pivot)
    }

    /// Pipeline against the configured provider. Fails when no API key is set.
    pub fn pipeline(&self) -> Result<RatePipeline> {
        let api_key = self.config.api_key()?;
        let provider = CurrencyFreaksProvider::new(
            &self.config.provider.base_url,
            &api_key,
            self.config.provider_timeout(),
        )?;
        Ok(RatePipeline::new(Arc::new(provider), self.store())
            .with_timeout(self.config.fetch_timeout()))
    }
}
