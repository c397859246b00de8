//! Scripted collaborators for unit tests.

use alloy::network::EthereumWallet;
use alloy::primitives::{keccak256, Address, TxHash, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::contracts::encoding::{AtomicBatchBuilder, BatchBuilder};
use crate::contracts::execution::{
    ContractDeployer, DeploymentReceipt, OwnershipReader, StatusCallback, StatusSource, Subscription,
};
use crate::contracts::ContractArtifact;
use crate::models::{Call, StatusEvent, TransactionRequest};
use crate::session::wallet_from_key;

pub const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn test_wallet() -> EthereumWallet {
    wallet_from_key(ANVIL_KEY, 31337).expect("valid test key").0
}

pub fn test_signer_address() -> Address {
    wallet_from_key(ANVIL_KEY, 31337).expect("valid test key").1
}

pub fn artifact(name: &str) -> ContractArtifact {
    ContractArtifact {
        name: name.to_string(),
        bytecode: alloy::primitives::Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
    }
}

/// Pushes a fixed list of status events into the callback it is given.
pub struct ScriptedStatusSource {
    script: Vec<StatusEvent>,
    reject: Option<String>,
    close_stream: bool,
    spawned: bool,
    opened: AtomicUsize,
    unsubscribes: Arc<AtomicUsize>,
    submitted: Mutex<Vec<TransactionRequest>>,
    held: Arc<Mutex<Vec<StatusCallback>>>,
}

impl ScriptedStatusSource {
    pub const TX_HASH: TxHash = TxHash::repeat_byte(0x77);

    pub fn new(script: Vec<StatusEvent>) -> Self {
        Self {
            script,
            reject: None,
            close_stream: false,
            spawned: false,
            opened: AtomicUsize::new(0),
            unsubscribes: Arc::new(AtomicUsize::new(0)),
            submitted: Mutex::new(Vec::new()),
            held: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reject every submission with `reason`.
    pub fn rejecting(mut self, reason: &str) -> Self {
        self.reject = Some(reason.to_string());
        self
    }

    /// Drop the callback once the script is exhausted.
    pub fn closing(mut self) -> Self {
        self.close_stream = true;
        self
    }

    /// Deliver from a separate task instead of inside `sign_and_watch`.
    pub fn spawned(mut self) -> Self {
        self.spawned = true;
        self
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.lock().expect("not poisoned").clone()
    }
}

fn deliver(script: Vec<StatusEvent>, callback: StatusCallback, close_stream: bool, held: &Mutex<Vec<StatusCallback>>) {
    for event in script {
        callback(event);
    }
    if !close_stream {
        held.lock().expect("not poisoned").push(callback);
    }
}

#[async_trait]
impl StatusSource for ScriptedStatusSource {
    async fn sign_and_watch(
        &self,
        request: &TransactionRequest,
        _signer: &EthereumWallet,
        callback: StatusCallback,
    ) -> Result<Subscription> {
        if let Some(reason) = &self.reject {
            return Err(anyhow::anyhow!("{}", reason));
        }

        self.submitted.lock().expect("not poisoned").push(request.clone());
        self.opened.fetch_add(1, Ordering::SeqCst);

        let script = self.script.clone();
        let close_stream = self.close_stream;
        if self.spawned {
            let held = self.held.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                deliver(script, callback, close_stream, &held);
            });
        } else {
            deliver(script, callback, close_stream, &self.held);
        }

        let unsubscribes = self.unsubscribes.clone();
        Ok(Subscription::new(Self::TX_HASH, move || {
            unsubscribes.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn description(&self) -> &str {
        "ScriptedStatusSource"
    }
}

/// Deterministic deployer: addresses derive from artifact name and arguments.
#[derive(Default)]
pub struct MockDeployer {
    delays: HashMap<String, Duration>,
    failing: Option<String>,
    deployments: AtomicUsize,
    completed: Mutex<Vec<Address>>,
}

impl MockDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(artifact: &str, args: &[U256]) -> String {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        format!("{}({})", artifact, args.join(","))
    }

    pub fn address_for(artifact: &str, args: &[U256]) -> Address {
        Address::from_word(keccak256(Self::key(artifact, args).as_bytes()))
    }

    /// Delay completion of the deployment identified by `key`.
    pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_string(), delay);
        self
    }

    /// Make the deployment identified by `key` revert.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing = Some(key.to_string());
        self
    }

    pub fn deployments(&self) -> usize {
        self.deployments.load(Ordering::SeqCst)
    }

    /// Addresses in the order their deployments finished.
    pub fn completion_order(&self) -> Vec<Address> {
        self.completed.lock().expect("not poisoned").clone()
    }
}

#[async_trait]
impl ContractDeployer for MockDeployer {
    async fn deploy(&self, artifact: &ContractArtifact, constructor_args: &[U256]) -> Result<DeploymentReceipt> {
        self.deployments.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(&artifact.name, constructor_args);

        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.as_deref() == Some(key.as_str()) {
            anyhow::bail!("Deployment transaction reverted: {}", key);
        }

        let address = Self::address_for(&artifact.name, constructor_args);
        self.completed.lock().expect("not poisoned").push(address);

        Ok(DeploymentReceipt {
            address,
            tx_hash: keccak256(key.as_bytes()),
            block_number: Some(1),
        })
    }

    fn deployer_address(&self) -> Address {
        test_signer_address()
    }

    fn description(&self) -> &str {
        "MockDeployer"
    }
}

/// Records every batch it is asked to build.
pub struct SpyBatchBuilder {
    inner: AtomicBatchBuilder,
    built: Mutex<Vec<TransactionRequest>>,
}

impl SpyBatchBuilder {
    pub const ARENA: Address = Address::repeat_byte(0xa4);

    pub fn new() -> Self {
        Self {
            inner: AtomicBatchBuilder::new(Self::ARENA),
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn build_count(&self) -> usize {
        self.built.lock().expect("not poisoned").len()
    }

    pub fn last_batch(&self) -> Option<TransactionRequest> {
        self.built.lock().expect("not poisoned").last().cloned()
    }
}

impl BatchBuilder for SpyBatchBuilder {
    fn register_call(&self, contender: Address) -> Call {
        self.inner.register_call(contender)
    }

    fn build(&self, calls: Vec<Call>) -> Result<TransactionRequest> {
        let request = self.inner.build(calls)?;
        self.built.lock().expect("not poisoned").push(request.clone());
        Ok(request)
    }

    fn description(&self) -> &str {
        "SpyBatchBuilder"
    }
}

/// Every contract is owned by `default_owner` unless overridden.
pub struct StaticOwners {
    default_owner: Address,
    overrides: HashMap<Address, Address>,
}

impl StaticOwners {
    pub fn new(default_owner: Address) -> Self {
        Self {
            default_owner,
            overrides: HashMap::new(),
        }
    }

    pub fn with_owner(mut self, contract: Address, owner: Address) -> Self {
        self.overrides.insert(contract, owner);
        self
    }
}

#[async_trait]
impl OwnershipReader for StaticOwners {
    async fn owner_of(&self, contract: Address) -> Result<Address> {
        Ok(self.overrides.get(&contract).copied().unwrap_or(self.default_owner))
    }
}
