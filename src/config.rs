use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlgodConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for AlgodConfig {
    fn default() -> Self {
        AlgodConfig {
            base_url: "https://testnet-api.algonode.cloud".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexerConfig {
    pub base_url: String,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            base_url: "https://testnet-idx.algonode.cloud".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketDataConfig {
    pub base_url: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        MarketDataConfig {
            base_url: "https://api.coinmarketcap.com".to_string(),
        }
    }
}

/// The index token and the pool account holding it. `operator_account`
/// names the credentials entry that signs for the pool; when it is absent
/// (or carries no signing key), fund-side legs are persisted unsigned.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FundConfig {
    pub address: String,
    pub asset_id: u64,
    #[serde(default)]
    pub operator_account: Option<String>,
}

fn default_confirmation_rounds() -> u64 {
    100
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub fund: FundConfig,
    #[serde(default)]
    pub algod: AlgodConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub market_data: MarketDataConfig,
    #[serde(default)]
    pub default_account: Option<String>,
    /// Overrides the credentials file location; mainly for tests.
    #[serde(default)]
    pub credentials_file: Option<String>,
    /// Directory unsigned transaction artifacts are written to.
    #[serde(default)]
    pub artifact_dir: Option<String>,
    #[serde(default = "default_confirmation_rounds")]
    pub confirmation_rounds: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "algoetf")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
