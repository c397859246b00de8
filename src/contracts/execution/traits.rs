use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;

use crate::contracts::ContractArtifact;
use crate::models::{StatusEvent, TransactionRequest};

/// What a mined deployment leaves behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Deploys one contract instance and waits until its creation is mined
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Deploy `artifact` with `constructor_args`
    ///
    /// # Returns
    /// * `Result<DeploymentReceipt>` - Only once the creating transaction is mined.
    ///   Errors if submission fails, the creation reverts, or no address is reported.
    async fn deploy(&self, artifact: &ContractArtifact, constructor_args: &[U256]) -> Result<DeploymentReceipt>;

    /// Get the address deployments are sent from
    fn deployer_address(&self) -> Address;

    /// Get a human-readable description of this deployer
    fn description(&self) -> &str;
}

/// Reads `owner()` of a deployed contract
#[async_trait]
pub trait OwnershipReader: Send + Sync {
    async fn owner_of(&self, contract: Address) -> Result<Address>;
}

/// Callback invoked for every status notification of one transaction.
///
/// Dropping it without having delivered a terminal status signals that the
/// stream closed.
pub type StatusCallback = Box<dyn Fn(StatusEvent) + Send + Sync>;

/// Handle to an open status subscription
pub struct Subscription {
    tx_hash: TxHash,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(tx_hash: TxHash, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            tx_hash,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Stop delivering notifications. Consumes the handle, so it runs once.
    pub fn unsubscribe(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

// A waiter dropped mid-flight still closes its subscription.
impl Drop for Subscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("tx_hash", &self.tx_hash)
            .finish()
    }
}

/// Signs, submits and streams status notifications for a transaction
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Sign `request` with `signer`, submit it and start pushing its status
    /// notifications into `callback`
    ///
    /// # Returns
    /// * `Ok(Subscription)` - The transaction was accepted for submission
    /// * `Err(_)` - Rejected before reaching the network; no subscription was opened
    async fn sign_and_watch(
        &self,
        request: &TransactionRequest,
        signer: &EthereumWallet,
        callback: StatusCallback,
    ) -> Result<Subscription>;

    /// Get a human-readable description of this source
    fn description(&self) -> &str;
}
