use crate::core::currency::CurrencyCode;
use crate::core::pipeline::DEFAULT_FETCH_TIMEOUT;
use crate::core::scheduler::{MAX_EVERY_MINUTES, Schedule};
use crate::providers::currency_freaks::DEFAULT_BASE_URL;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "CURRENCY_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_provider_timeout_secs() -> u64 {
    20
}

fn default_pivot() -> CurrencyCode {
    CurrencyCode::PIVOT
}

fn default_symbols() -> Vec<CurrencyCode> {
    vec![CurrencyCode::EUR, CurrencyCode::USD, CurrencyCode::JPY]
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_display_precision() -> u32 {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default = "default_pivot")]
    pub pivot: CurrencyCode,
    #[serde(default = "default_symbols")]
    pub symbols: Vec<CurrencyCode>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub schedule: Schedule,
    pub data_path: Option<String>,
    #[serde(default = "default_display_precision")]
    pub display_precision: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            provider: ProviderConfig::default(),
            pivot: default_pivot(),
            symbols: default_symbols(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            schedule: Schedule::default(),
            data_path: None,
            display_precision: default_display_precision(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "pivotfx", "pivotfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "pivotfx", "pivotfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("rates"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        let config = config.normalized()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Drops the pivot and duplicates from `symbols` and checks the numeric
    /// settings.
    pub fn normalized(mut self) -> Result<Self> {
        let pivot = self.pivot;
        let mut symbols = Vec::with_capacity(self.symbols.len());
        for code in self.symbols.drain(..) {
            if code != pivot && !symbols.contains(&code) {
                symbols.push(code);
            }
        }
        if symbols.is_empty() {
            bail!("symbols must list at least one currency other than the pivot {pivot}");
        }
        self.symbols = symbols;

        if self.fetch_timeout_secs == 0 || self.provider.timeout_secs == 0 {
            bail!("timeouts must be positive");
        }
        if let Schedule::EveryMinutes(minutes) = self.schedule
            && !(1..=MAX_EVERY_MINUTES).contains(&minutes)
        {
            bail!("schedule.every_minutes must be between 1 and {MAX_EVERY_MINUTES}, got {minutes}");
        }
        if self.display_precision > 10 {
            bail!(
                "display_precision must be at most 10, got {}",
                self.display_precision
            );
        }
        Ok(self)
    }

    /// Provider key, preferring the environment over the config file.
    pub fn api_key(&self) -> Result<String> {
        resolve_api_key(
            std::env::var(API_KEY_ENV).ok(),
            self.provider.api_key.as_deref(),
        )
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn resolve_api_key(from_env: Option<String>, from_file: Option<&str>) -> Result<String> {
    from_env
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| {
            from_file
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        })
        .with_context(|| format!("{API_KEY_ENV} is empty and provider.api_key is not set"))
}
