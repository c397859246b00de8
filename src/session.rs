use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use anyhow::Result;
use tracing::info;
use url::Url;

use crate::config::AppConfig;

/// Shared, read-only handle to the chain.
///
/// Signing providers are derived from it per submission; nothing mutates it
/// after construction.
#[derive(Clone)]
pub struct ChainSession {
    rpc_url: Url,
    chain_id: u64,
    provider: DynProvider,
}

impl ChainSession {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let rpc_url: Url = config.chain.rpc_url.parse()
            .map_err(|e| anyhow::anyhow!("Invalid RPC URL '{}': {}", config.chain.rpc_url, e))?;

        let provider = ProviderBuilder::new()
            .connect_http(rpc_url.clone())
            .erased();

        info!("🔗 Chain session ready: {} (chain id {})", rpc_url, config.chain.chain_id);

        Ok(Self {
            rpc_url,
            chain_id: config.chain.chain_id,
            provider,
        })
    }

    /// Read-only provider for queries and polling.
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Provider that signs with `wallet`.
    pub fn signing_provider(&self, wallet: &EthereumWallet) -> DynProvider {
        ProviderBuilder::new()
            .wallet(wallet.clone())
            .connect_http(self.rpc_url.clone())
            .erased()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Check that the endpoint answers and reports the configured chain id.
    pub async fn verify_connectivity(&self) -> Result<u64> {
        let remote_chain_id = self.provider.get_chain_id().await
            .map_err(|e| anyhow::anyhow!("Failed to reach {}: {}", self.rpc_url, e))?;
        if remote_chain_id != self.chain_id {
            anyhow::bail!(
                "Endpoint reports chain id {}, configured chain id is {}",
                remote_chain_id,
                self.chain_id
            );
        }
        let block = self.provider.get_block_number().await?;
        info!("✅ Connected to chain {} at block {}", remote_chain_id, block);
        Ok(block)
    }
}

/// Build the signing identity from a hex private key.
pub fn wallet_from_key(private_key: &str, chain_id: u64) -> Result<(EthereumWallet, Address)> {
    let signer: PrivateKeySigner = private_key.parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse private key: {}", e))?;
    let signer = alloy::signers::Signer::with_chain_id(signer, Some(chain_id));
    let address = signer.address();
    Ok((EthereumWallet::from(signer), address))
}
