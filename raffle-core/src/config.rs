use crate::error::{RaffleError, Result};
use crate::types::Amount;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Networks where a local mock coordinator stands in for the real oracle
pub const DEVELOPMENT_NETWORKS: &[&str] = &["hardhat", "localhost"];

const DEFAULT_KEY_HASH: &str =
    "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15";

/// Upper bound the coordinator accepts for words per request
pub const MAX_NUM_WORDS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleConfig {
    pub network: String,
    pub ticket_price: Amount,
    pub interval: Duration,
    pub oracle: OracleConfig,
}

/// Parameters identifying how randomness is requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Coordinator address, absent when a local mock is deployed
    pub coordinator: Option<String>,
    /// Gas lane the request is priced against
    pub key_hash: String,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            coordinator: None,
            key_hash: DEFAULT_KEY_HASH.to_string(),
            subscription_id: 0,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        }
    }
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            network: "hardhat".to_string(),
            ticket_price: Amount::from_units(100_000_000_000_000_000), // 0.1
            interval: Duration::from_secs(30),
            oracle: OracleConfig::default(),
        }
    }
}

impl RaffleConfig {
    pub fn for_network(network: &str) -> Result<Self> {
        let mut config = Self::default();

        match network {
            "hardhat" | "localhost" => {
                // keep local defaults
                config.network = network.to_string();
            }
            "goerli" => {
                config.network = network.to_string();
                config.oracle.coordinator =
                    Some("0x2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D".to_string());
                config.oracle.subscription_id = 3336;
            }
            other => {
                return Err(RaffleError::config(format!("Unknown network '{}'", other)));
            }
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        DEVELOPMENT_NETWORKS.contains(&self.network.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticket_price.is_zero() {
            return Err(RaffleError::config("Ticket price must be greater than 0"));
        }

        if self.interval.is_zero() {
            return Err(RaffleError::config("Interval must be greater than 0"));
        }

        self.oracle.validate()?;

        if !self.is_development() && self.oracle.coordinator.is_none() {
            return Err(RaffleError::config(format!(
                "Network '{}' needs a coordinator address",
                self.network
            )));
        }

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<()> {
        let key_hash = self.key_hash.strip_prefix("0x").unwrap_or(&self.key_hash);
        let decoded = hex::decode(key_hash)
            .map_err(|e| RaffleError::config(format!("Invalid key hash: {}", e)))?;
        if decoded.len() != 32 {
            return Err(RaffleError::config("Key hash must be 32 bytes"));
        }

        if self.callback_gas_limit == 0 {
            return Err(RaffleError::config("Callback gas limit must be greater than 0"));
        }

        if self.num_words == 0 || self.num_words > MAX_NUM_WORDS {
            return Err(RaffleError::config(format!(
                "Number of words must be between 1 and {}",
                MAX_NUM_WORDS
            )));
        }

        Ok(())
    }
}
