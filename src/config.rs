use alloy::primitives::Address;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{default_contenders, ContractSpec};

/// Multicall3, deployed at the same address on most EVM chains.
pub const MULTICALL3_ADDRESS: Address = alloy::primitives::address!("cA11bde05977b3631167028862bE2a173976CA11");

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub chain: ChainDetails,
    pub deployer: DeployerConfig,
    pub registry: RegistryConfig,
    pub confirmation: ConfirmationConfig,
    pub contracts: Vec<ContractSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainDetails {
    pub rpc_url: String,
    pub chain_id: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeployerConfig {
    pub private_key: String,
    pub artifacts_dir: String,
    /// Issue all deployments before awaiting any of them
    #[serde(default)]
    pub concurrent: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    pub arena_address: Address,
    #[serde(default = "default_multicall")]
    pub multicall_address: Address,
    /// Check `owner()` of every contender before registering it
    #[serde(default)]
    pub verify_owner: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfirmationConfig {
    /// Unset means wait for a terminal status indefinitely
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_multicall() -> Address {
    MULTICALL3_ADDRESS
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_log_events() -> bool {
    true
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        tracing::info!("Loading configuration...");

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ARENA_DEPLOY").separator("__"))
            .build()?;

        let mut config: AppConfig = match settings.try_deserialize() {
            Ok(config) => {
                tracing::info!("Configuration loaded from file/environment");
                config
            }
            Err(e) => {
                tracing::warn!("Could not load configuration from file/environment ({}), using defaults", e);
                AppConfig::default()
            }
        };

        // Override with environment variables if present
        if let Ok(private_key) = std::env::var("DEPLOYER_PRIVATE_KEY") {
            config.deployer.private_key = private_key;
        }

        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            config.chain.rpc_url = rpc_url;
        }

        config.validate()?;

        tracing::info!("Final configuration:");
        tracing::info!("  Chain: {} (id {})", config.chain.rpc_url, config.chain.chain_id);
        tracing::info!("  Arena registry: {}", config.registry.arena_address);
        tracing::info!("  Batch contract: {}", config.registry.multicall_address);
        tracing::info!("  Contracts: {}", config.contracts.len());
        tracing::info!("  Confirmation timeout: {:?}", config.confirmation.timeout());

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry.arena_address == Address::ZERO {
            anyhow::bail!("registry.arena_address must be set");
        }
        if self.contracts.is_empty() {
            anyhow::bail!("At least one contract must be configured");
        }
        if self.confirmation.poll_interval_ms == 0 {
            anyhow::bail!("confirmation.poll_interval_ms must be positive");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainDetails {
                rpc_url: "http://localhost:8545".to_string(),
                chain_id: 595,
            },
            deployer: DeployerConfig {
                private_key: "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
                artifacts_dir: "build".to_string(),
                concurrent: false,
            },
            registry: RegistryConfig {
                arena_address: Address::ZERO,
                multicall_address: MULTICALL3_ADDRESS,
                verify_owner: false,
            },
            confirmation: ConfirmationConfig {
                timeout_seconds: None,
                poll_interval_ms: default_poll_interval_ms(),
                log_events: true,
            },
            contracts: default_contenders(),
        }
    }
}
