use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub base_currency: String,
    pub symbol: String,
    pub timeout_secs: u64,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://api.metalpriceapi.com/v1/latest".to_string(),
            api_key: String::new(),
            base_currency: "USD".to_string(),
            symbol: "XAU".to_string(),
            timeout_secs: 10,
            retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upper bound for one price fetch, all retries included.
    pub fn fetch_budget(&self) -> Duration {
        let attempts = self.retries as u32 + 1;
        self.timeout() * attempts + Duration::from_millis(self.retry_delay_ms) * self.retries as u32
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TradingConfig {
    pub commission_rate: Decimal,
    pub starting_balance: Decimal,
    pub price_ttl_secs: u64,
    pub page_size: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            commission_rate: Decimal::new(2, 2),
            starting_balance: Decimal::new(1_000_000, 2),
            price_ttl_secs: 300,
            page_size: 10,
        }
    }
}

impl TradingConfig {
    pub fn price_ttl(&self) -> Duration {
        Duration::from_secs(self.price_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    pub data_path: Option<String>,
    /// How long a command waits for another one holding the data directory.
    #[serde(default = "default_lock_wait_secs")]
    pub lock_wait_secs: u64,
}

fn default_lock_wait_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            provider: ProviderConfig::default(),
            trading: TradingConfig::default(),
            data_path: None,
            lock_wait_secs: default_lock_wait_secs(),
        }
    }
}

impl AppConfig {
    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(self.lock_wait_secs)
    }

    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "aurum", "aurum")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("dev", "aurum", "aurum")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let trading = &self.trading;
        if trading.commission_rate < Decimal::ZERO || trading.commission_rate >= Decimal::ONE {
            anyhow::bail!(
                "commission_rate must be in [0, 1), got {}",
                trading.commission_rate
            );
        }
        if trading.starting_balance < Decimal::ZERO {
            anyhow::bail!(
                "starting_balance must not be negative, got {}",
                trading.starting_balance
            );
        }
        if trading.page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }
        if self.provider.timeout_secs == 0 {
            anyhow::bail!("provider timeout_secs must be at least 1");
        }
        Ok(())
    }
}
