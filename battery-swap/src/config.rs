//! Configuration for the swap engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Swap engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name, attached to log lines
    pub service_name: String,

    /// World state store
    pub ledger: ledger_core::Config,

    /// Settlement ratios
    pub settlement: SettlementConfig,

    /// Log output
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "battery-swap".to_string(),
            ledger: ledger_core::Config::default(),
            settlement: SettlementConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Settlement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Share of the unconsumed escrow returned to the renter (0.0 - 1.0)
    pub refund_ratio: f64,

    /// Share of the consumption fee paid to the third-party network (0.0 - 1.0)
    pub network_share: f64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            refund_ratio: 0.9,
            network_share: 0.85,
        }
    }
}

impl SettlementConfig {
    /// Both ratios must lie in [0, 1]
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("refund_ratio", self.refund_ratio),
            ("network_share", self.network_share),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(crate::Error::Config(format!(
                    "settlement.{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("SWAP_DATA_DIR") {
            config.ledger.data_dir = PathBuf::from(dir);
        }

        if let Ok(ratio) = std::env::var("SWAP_REFUND_RATIO") {
            config.settlement.refund_ratio = parse_env("SWAP_REFUND_RATIO", &ratio)?;
        }

        if let Ok(share) = std::env::var("SWAP_NETWORK_SHARE") {
            config.settlement.network_share = parse_env("SWAP_NETWORK_SHARE", &share)?;
        }

        if let Ok(json) = std::env::var("SWAP_LOG_JSON") {
            config.log.json = parse_env("SWAP_LOG_JSON", &json)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> crate::Result<()> {
        self.ledger.validate()?;
        self.settlement.validate()
    }
}

fn parse_env<T>(name: &str, value: &str) -> crate::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| crate::Error::Config(format!("{}: {}", name, e)))
}
