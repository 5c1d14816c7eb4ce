//! Client configuration
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file, then
//! `ETHLEND_*` environment variables (`__` separates nested keys, e.g.
//! `ETHLEND_RPC__URL`). A `.env` file is loaded first when present.

use std::time::Duration;

use alloy_primitives::{address, Address};
use config::{Config, Environment, File, FileFormat};
use ethlend_common::{EthlendError, ProtocolParams, Result};
use serde::{Deserialize, Serialize};

use crate::ledger::evm::ConfirmationPolicy;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "ethlend.toml";

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EthlendConfig {
    /// Wallet endpoint
    pub rpc: RpcSettings,
    /// Deployed contracts
    pub contracts: ContractSettings,
    /// Protocol parameters
    pub protocol: ProtocolParams,
}

impl EthlendConfig {
    /// Load configuration from `path` (or `ethlend.toml` if it exists) and
    /// the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(defaults()?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("ETHLEND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| EthlendError::Config(e.to_string()))
    }

    /// Defaults overlaid with a TOML document
    pub fn from_toml(toml: &str) -> Result<Self> {
        Config::builder()
            .add_source(defaults()?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| EthlendError::Config(e.to_string()))
    }

    /// Receipt polling for submitted transactions
    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.rpc.poll_interval_ms),
            timeout: Duration::from_millis(self.rpc.confirmation_timeout_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc.request_timeout_ms)
    }
}

fn defaults() -> Result<Config> {
    Config::try_from(&EthlendConfig::default()).map_err(|e| EthlendError::Config(e.to_string()))
}

/// Wallet JSON-RPC settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcSettings {
    /// EIP-1193 compatible JSON-RPC endpoint of the wallet
    pub url: String,
    /// Receipt poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Give up waiting for a receipt after this many milliseconds
    pub confirmation_timeout_ms: u64,
    /// Per-request HTTP timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            poll_interval_ms: 1_000,
            confirmation_timeout_ms: 120_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Contract addresses of the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSettings {
    /// Lending contract
    pub lending: Address,
    /// USDT debt token
    pub usdt: Address,
}

impl Default for ContractSettings {
    fn default() -> Self {
        Self {
            lending: address!("07e97Dae913F0AdA300d59357D9EaaeB60d244ee"),
            usdt: address!("17129Ce1bdD0A7892a92419E037a8020B5b74F54"),
        }
    }
}
