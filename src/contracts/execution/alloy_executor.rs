use crate::contracts::abi::IOwnable;
use crate::contracts::execution::traits::{ContractDeployer, DeploymentReceipt, OwnershipReader};
use crate::contracts::ContractArtifact;
use crate::session::ChainSession;
use alloy::{
    dyn_abi::DynSolValue,
    network::{Ethereum, EthereumWallet, TransactionBuilder, TxSigner},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Deploys contracts and reads their state through Alloy providers
///
/// All deployments go through one signing provider so its nonce cache is
/// shared, which keeps concurrent deployments on consecutive nonces.
pub struct AlloyExecutor {
    session: Arc<ChainSession>,
    signer: DynProvider,
    address: Address,
}

impl AlloyExecutor {
    pub fn new(session: Arc<ChainSession>, wallet: EthereumWallet) -> Self {
        let address = wallet.default_signer().address();

        info!("🔧 Initializing AlloyExecutor");
        info!("  Deployer address: {:?}", address);
        info!("  Chain ID: {}", session.chain_id());

        let signer = session.signing_provider(&wallet);

        Self {
            session,
            signer,
            address,
        }
    }

    #[cfg(test)]
    fn with_signing_provider(mut self, signer: DynProvider) -> Self {
        self.signer = signer;
        self
    }

    async fn submit(&self, tx_request: TransactionRequest) -> Result<PendingTransactionBuilder<Ethereum>> {
        self.signer
            .send_transaction(tx_request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send deployment transaction: {}", e))
    }

    /// Build the creation transaction: bytecode followed by the ABI-encoded arguments
    fn build_deploy_request(&self, artifact: &ContractArtifact, constructor_args: &[U256]) -> TransactionRequest {
        let mut code = artifact.bytecode.to_vec();
        code.extend_from_slice(&encode_constructor_args(constructor_args));

        TransactionRequest::default()
            .with_from(self.address)
            .with_deploy_code(Bytes::from(code))
    }
}

/// Each argument becomes one `uint256` word.
pub fn encode_constructor_args(args: &[U256]) -> Vec<u8> {
    DynSolValue::Tuple(args.iter().map(|arg| DynSolValue::Uint(*arg, 256)).collect()).abi_encode_params()
}

#[async_trait]
impl ContractDeployer for AlloyExecutor {
    async fn deploy(&self, artifact: &ContractArtifact, constructor_args: &[U256]) -> Result<DeploymentReceipt> {
        info!("🚀 AlloyExecutor: Deploying {}", artifact.name);
        info!("  Constructor args: {:?}", constructor_args);
        info!("  Bytecode: {} bytes", artifact.bytecode.len());

        let tx_request = self.build_deploy_request(artifact, constructor_args);

        let pending_tx = self.submit(tx_request).await
            .inspect_err(|e| error!("❌ Deployment of {} was not accepted: {}", artifact.name, e))?;

        let tx_hash = *pending_tx.tx_hash();
        info!("⏳ Deployment of {} sent ({}), waiting to be mined...", artifact.name, tx_hash);

        let receipt = pending_tx.get_receipt().await
            .map_err(|e| anyhow::anyhow!("Failed to get deployment receipt for {}: {}", tx_hash, e))?;

        if !receipt.status() {
            error!("❌ Deployment of {} reverted", artifact.name);
            error!("  Transaction hash: {}", tx_hash);
            error!("  Block number: {:?}", receipt.block_number);
            return Err(anyhow::anyhow!("Deployment transaction reverted: {}", tx_hash));
        }

        let address = receipt.contract_address
            .ok_or_else(|| anyhow::anyhow!("Receipt for {} carries no contract address", tx_hash))?;

        info!("✅ {} deployed at {:?}", artifact.name, address);
        debug!("  Block number: {:?}, gas used: {}", receipt.block_number, receipt.gas_used);

        Ok(DeploymentReceipt {
            address,
            tx_hash,
            block_number: receipt.block_number,
        })
    }

    fn deployer_address(&self) -> Address {
        self.address
    }

    fn description(&self) -> &str {
        "AlloyExecutor: Deploys contracts with Alloy providers and waits for their receipts"
    }
}

#[async_trait]
impl OwnershipReader for AlloyExecutor {
    async fn owner_of(&self, contract: Address) -> Result<Address> {
        debug!("🔍 Reading owner() of {}", contract);

        let call_request = TransactionRequest::default()
            .with_to(contract)
            .with_from(self.address)
            .with_input(IOwnable::ownerCall {}.abi_encode());

        let result = self.session.provider().call(call_request).await
            .map_err(|e| anyhow::anyhow!("owner() call failed on {}: {}", contract, e))?;

        let owner = IOwnable::ownerCall::abi_decode_returns(&result)
            .map_err(|e| anyhow::anyhow!("Unexpected owner() return data from {}: {}", contract, e))?;

        Ok(owner)
    }
}
